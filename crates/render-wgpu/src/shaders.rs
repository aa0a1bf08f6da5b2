/// WGSL for lit, textured meshes. Light layout mirrors `prism_render::GpuLight`.
pub const MESH_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 8u;
const LIGHT_DIRECTIONAL: u32 = 0u;
const LIGHT_SPOT: u32 = 2u;

struct Camera {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

struct Light {
    color: vec4<f32>,
    position_range: vec4<f32>,
    direction: vec4<f32>,
    cone: vec4<f32>,
    kind: vec4<u32>,
};

struct Lights {
    ambient: vec4<f32>,
    count: vec4<u32>,
    lights: array<Light, 8>,
};

struct Draw {
    world: mat4x4<f32>,
    world_view_proj: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    diffuse_color: vec4<f32>,
    // x: specular power
    material: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> lights: Lights;
@group(1) @binding(0) var<uniform> draw: Draw;
@group(2) @binding(0) var diffuse_tex: texture_2d<f32>;
@group(2) @binding(1) var normal_tex: texture_2d<f32>;
@group(2) @binding(2) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) uv: vec2<f32>,
    @location(4) tangent: vec3<f32>,
    @location(5) bitangent: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) bitangent: vec3<f32>,
    @location(4) uv: vec2<f32>,
    @location(5) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = draw.world_view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_pos = (draw.world * vec4<f32>(vertex.position, 1.0)).xyz;
    out.normal = normalize((draw.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.tangent = normalize((draw.world * vec4<f32>(vertex.tangent, 0.0)).xyz);
    out.bitangent = normalize((draw.world * vec4<f32>(vertex.bitangent, 0.0)).xyz);
    out.uv = vertex.uv;
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(diffuse_tex, material_sampler, in.uv) * draw.diffuse_color * in.color;
    let tangent_normal = textureSample(normal_tex, material_sampler, in.uv).xyz * 2.0 - 1.0;
    let tbn = mat3x3<f32>(normalize(in.tangent), normalize(in.bitangent), normalize(in.normal));
    let n = normalize(tbn * tangent_normal);
    let v = normalize(camera.eye.xyz - in.world_pos);

    var color = lights.ambient.rgb * albedo.rgb;
    let count = min(lights.count.x, MAX_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let light = lights.lights[i];
        var l: vec3<f32>;
        var attenuation = 1.0;
        if (light.kind.x == LIGHT_DIRECTIONAL) {
            l = -normalize(light.direction.xyz);
        } else {
            let to_light = light.position_range.xyz - in.world_pos;
            let dist = length(to_light);
            l = to_light / max(dist, 0.0001);
            let falloff = clamp(1.0 - dist / max(light.position_range.w, 0.0001), 0.0, 1.0);
            attenuation = falloff * falloff;
            if (light.kind.x == LIGHT_SPOT) {
                let cos_angle = dot(-l, normalize(light.direction.xyz));
                attenuation = attenuation * smoothstep(light.cone.y, light.cone.x, cos_angle);
            }
        }
        let n_dot_l = max(dot(n, l), 0.0);
        let h = normalize(l + v);
        let specular = pow(max(dot(n, h), 0.0), draw.material.x) * select(0.0, 1.0, n_dot_l > 0.0);
        color = color + (albedo.rgb * n_dot_l + vec3<f32>(specular)) * light.color.rgb * attenuation;
    }
    return vec4<f32>(color, albedo.a);
}
"#;
