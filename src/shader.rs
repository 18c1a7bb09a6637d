//! WGSL generation for the particle and post-process passes.
//!
//! The particle shader runs the per-frame transform of [`crate::transform`]
//! on the GPU. Its constants are formatted in from that module so the two
//! implementations cannot drift apart.

use crate::noise::SIMPLEX_WGSL;
use crate::transform::{
    EXPOSURE_BOOST, FLOAT_AMPLITUDE, POINT_SCALE, PULSE_DEPTH, VERTICAL_DRIFT, VORTEX_ANGLE,
    VORTEX_CUTOFF, VORTEX_FALLOFF,
};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// Per-frame uniforms for the particle pass. Matches `Uniforms` in
/// [`render_shader`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Surface size in pixels.
    pub viewport: [f32; 2],
    pub time: f32,
    pub morph_factor: f32,
}

impl RenderUniforms {
    pub fn new(view_proj: Mat4, view: Mat4, viewport: Vec2, time: f32, morph_factor: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            viewport: viewport.to_array(),
            time,
            morph_factor,
        }
    }
}

/// Uniforms for the post-process pass. Matches `PostUniforms` in
/// [`post_process_shader`].
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PostUniforms {
    pub exposure: f32,
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,
    pub bloom_radius: f32,
    pub grain: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub time: f32,
    /// One pixel in UV units.
    pub texel_size: [f32; 2],
    pub _padding: [f32; 2],
}

/// Generate the particle render shader.
///
/// Vertex inputs are five per-instance attributes at locations 0..=4:
/// assembled position, scattered position, color, size, seed.
pub fn render_shader() -> String {
    format!(
        r#"struct Uniforms {{
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec2<f32>,
    time: f32,
    morph_factor: f32,
}};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) sparkle: f32,
}};

const PI: f32 = 3.14159265;
{SIMPLEX_WGSL}
@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) assembled: vec3<f32>,
    @location(1) scattered: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) size: f32,
    @location(4) seed: vec3<f32>,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    let t = uniforms.time;
    let m = clamp(uniforms.morph_factor, 0.0, 1.0);

    var pos = mix(assembled, scattered, m);

    let drift = vec3<f32>(
        snoise(vec3<f32>(t * 0.1, seed.y, 0.0)),
        snoise(vec3<f32>(seed.x, t * 0.15, 0.0)) * {VERTICAL_DRIFT:?},
        snoise(vec3<f32>(0.0, seed.z, t * 0.1)),
    );
    pos += drift * (m * {FLOAT_AMPLITUDE:?});

    let spin = sin(m * PI);
    if spin > {VORTEX_CUTOFF:?} {{
        let angle = spin * {VORTEX_ANGLE:?} * (1.0 - length(assembled.xz) * {VORTEX_FALLOFF:?});
        let s = sin(angle);
        let c = cos(angle);
        pos = vec3<f32>(c * pos.x + s * pos.z, pos.y, -s * pos.x + c * pos.z);
    }}

    let pulse = 1.0 + sin(t * 2.0 + seed.x * 10.0) * {PULSE_DEPTH:?} * m;
    let view_pos = uniforms.view * vec4<f32>(pos, 1.0);
    let depth = max(-view_pos.z, 0.001);
    let size_px = size * {POINT_SCALE:?} * pulse / depth;

    var clip_pos = uniforms.view_proj * vec4<f32>(pos, 1.0);
    clip_pos.x += quad_pos.x * size_px / uniforms.viewport.x * clip_pos.w;
    clip_pos.y += quad_pos.y * size_px / uniforms.viewport.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = color;
    out.uv = quad_pos;
    out.sparkle = snoise(pos * 0.5 + vec3<f32>(t * 2.0));
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = length(in.uv) * 0.5;

    let core = 1.0 - smoothstep(0.0, 0.15, dist);
    let glow = 1.0 - smoothstep(0.0, 0.5, dist);
    let alpha = core + glow * 0.4;
    if alpha < 0.01 {{
        discard;
    }}

    let twinkle = 0.7 + 0.3 * sin(in.sparkle * 10.0);
    let color = in.color * twinkle * {EXPOSURE_BOOST:?};
    return vec4<f32>(color * alpha, 1.0);
}}
"#
    )
}

/// Pixel scale for star sizes (`size * STAR_POINT_SCALE / depth`).
pub const STAR_POINT_SCALE: f32 = 30.0;
/// Steepness of the soft star edge.
const STAR_FADE: f32 = 16.0;

/// Generate the background star shader.
///
/// Vertex inputs are one interleaved [`crate::stars::Star`] per instance:
/// position, color, size at locations 0..=2. `uniforms.time` is the scaled
/// star clock and `morph_factor` is unused.
pub fn star_shader() -> String {
    format!(
        r#"struct Uniforms {{
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    viewport: vec2<f32>,
    time: f32,
    morph_factor: f32,
}};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) size: f32,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    let view_pos = uniforms.view * vec4<f32>(position, 1.0);
    let depth = max(-view_pos.z, 0.001);
    let size_px = size * ({STAR_POINT_SCALE:?} / depth) * (3.0 + sin(uniforms.time + 100.0));

    var clip_pos = uniforms.view_proj * vec4<f32>(position, 1.0);
    clip_pos.x += quad_pos.x * size_px / uniforms.viewport.x * clip_pos.w;
    clip_pos.y += quad_pos.y * size_px / uniforms.viewport.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.color = color;
    out.uv = quad_pos;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = length(in.uv) * 0.5;
    let opacity = 1.0 / (1.0 + exp({STAR_FADE:?} * (dist - 0.25)));
    return vec4<f32>(in.color * opacity, 1.0);
}}
"#
    )
}

/// Generate the fullscreen post-process shader: thresholded bloom, film
/// grain, vignette, then exposure and ACES filmic tone mapping.
pub fn post_process_shader() -> String {
    r#"struct PostUniforms {
    exposure: f32,
    bloom_threshold: f32,
    bloom_intensity: f32,
    bloom_radius: f32,
    grain: f32,
    vignette_offset: f32,
    vignette_darkness: f32,
    time: f32,
    texel_size: vec2<f32>,
    _padding: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var scene: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;
@group(0) @binding(2)
var<uniform> post: PostUniforms;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

fn luminance(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
}

fn bright_part(c: vec3<f32>) -> vec3<f32> {
    let l = luminance(c);
    return c * (max(l - post.bloom_threshold, 0.0) / max(l, 0.0001));
}

fn bloom(uv: vec2<f32>) -> vec3<f32> {
    // Three rings of eight taps, widening with the bloom radius.
    let spread = 4.0 + post.bloom_radius * 24.0;
    var sum = bright_part(textureSampleLevel(scene, scene_sampler, uv, 0.0).rgb);
    var weight_sum = 1.0;
    for (var ring = 1; ring <= 3; ring++) {
        let r = f32(ring) * spread;
        let w = 1.0 / f32(ring + 1);
        for (var k = 0; k < 8; k++) {
            let a = f32(k) * 0.785398 + f32(ring) * 0.3927;
            let offset = vec2<f32>(cos(a), sin(a)) * r * post.texel_size;
            sum += bright_part(textureSampleLevel(scene, scene_sampler, uv + offset, 0.0).rgb) * w;
            weight_sum += w;
        }
    }
    return sum / weight_sum;
}

fn hash(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

fn aces_filmic(x: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((x * (a * x + b)) / (x * (c * x + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var color = textureSampleLevel(scene, scene_sampler, in.uv, 0.0).rgb;
    color += bloom(in.uv) * post.bloom_intensity;

    let grain = hash(in.uv * 1000.0 + vec2<f32>(post.time, post.time * 1.3)) - 0.5;
    color += vec3<f32>(grain * post.grain);

    let dist = distance(in.uv, vec2<f32>(0.5));
    let inner = min(post.vignette_offset * 0.799, 0.79);
    let vignette = 1.0 - smoothstep(inner, 0.8, dist * (post.vignette_darkness + post.vignette_offset));
    color *= vignette;

    color = aces_filmic(max(color, vec3<f32>(0.0)) * post.exposure);
    return vec4<f32>(color, 1.0);
}
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layouts() {
        assert_eq!(std::mem::size_of::<RenderUniforms>(), 144);
        assert_eq!(std::mem::size_of::<PostUniforms>(), 48);
    }

    #[test]
    fn test_render_shader_shares_constants() {
        let src = render_shader();
        assert!(src.contains("fn snoise"));
        assert!(src.contains(&format!("{:?}", POINT_SCALE)));
        assert!(src.contains(&format!("{:?}", EXPOSURE_BOOST)));
        assert!(!src.contains("{{"));
    }

    #[test]
    fn test_star_shader_scale() {
        let src = star_shader();
        assert!(src.contains(&format!("{:?} / depth", STAR_POINT_SCALE)));
        assert!(!src.contains("{{"));
    }
}
