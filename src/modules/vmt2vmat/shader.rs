//! Picks the Source 2 shader for a material.
//!
//! The legacy shader name seeds a score table, then a handful of parameter
//! heuristics vote on top of it. Ties resolve to the earliest declared
//! candidate so the outcome never depends on hash order.

use vmt::{clean_value, ParamMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shader {
    Sky,
    VrBlackUnlit,
    VrComplex,
    VrSimple,
    VrSimple2WayBlend,
    VrSimple3LayerParallax,
    VrEyeball,
    VrGlass,
    VrMonitor,
    VrProjectedDecals,
    VrStaticOverlay,
    SimpleWater,
    Refract,
    Cables,
    GlobalLitSimple,
}

impl Shader {
    pub fn name(&self) -> &'static str {
        match self {
            Shader::Sky => "sky",
            Shader::VrBlackUnlit => "vr_black_unlit",
            Shader::VrComplex => "vr_complex",
            Shader::VrSimple => "vr_simple",
            Shader::VrSimple2WayBlend => "vr_simple_2way_blend",
            Shader::VrSimple3LayerParallax => "vr_simple_3layer_parallax",
            Shader::VrEyeball => "vr_eyeball",
            Shader::VrGlass => "vr_glass",
            Shader::VrMonitor => "vr_monitor",
            Shader::VrProjectedDecals => "vr_projected_decals",
            Shader::VrStaticOverlay => "vr_static_overlay",
            Shader::SimpleWater => "simple_water",
            Shader::Refract => "refract",
            Shader::Cables => "cables",
            Shader::GlobalLitSimple => "global_lit_simple",
        }
    }
}

/// Legacy shader name to seeded candidate. Substring matching against this
/// table also decides whether a material is convertible at all.
const MATERIAL_TYPES: &[(&str, Shader)] = &[
    ("sky", Shader::Sky),
    ("unlitgeneric", Shader::VrComplex),
    ("vertexlitgeneric", Shader::VrComplex),
    ("decalmodulate", Shader::VrComplex),
    ("lightmappedgeneric", Shader::VrComplex),
    ("lightmappedreflective", Shader::VrComplex),
    ("character", Shader::VrComplex),
    ("customcharacter", Shader::VrComplex),
    ("patch", Shader::VrComplex),
    ("teeth", Shader::VrComplex),
    ("eyes", Shader::VrEyeball),
    ("eyeball", Shader::VrEyeball),
    ("water", Shader::SimpleWater),
    ("refract", Shader::Refract),
    ("worldvertextransition", Shader::VrSimple2WayBlend),
    ("lightmapped_4wayblend", Shader::VrSimple2WayBlend),
    ("cables", Shader::Cables),
    ("lightmappedtwotexture", Shader::VrComplex),
    ("unlittwotexture", Shader::VrComplex),
];

fn material_type_shader(mat_type: &str) -> Option<Shader> {
    MATERIAL_TYPES
        .iter()
        .find(|(name, _)| *name == mat_type)
        .map(|(_, shader)| *shader)
}

/// Substring check used both for material type tokens and for sniffing
/// whether an included patch base looks like a material at all.
pub fn is_recognized_material(text: &str) -> bool {
    MATERIAL_TYPES.iter().any(|(name, _)| text.contains(name))
}

/// Candidates in a fixed order. `best` takes the first strict maximum, so
/// earlier rows win ties.
struct ScoreTable {
    scores: Vec<(Shader, i32)>,
}

impl ScoreTable {
    fn new() -> Self {
        let candidates = [
            Shader::VrBlackUnlit,
            Shader::VrComplex,
            Shader::Sky,
            Shader::VrSimple,
            Shader::VrSimple2WayBlend,
            Shader::VrSimple3LayerParallax,
            Shader::VrEyeball,
            Shader::VrGlass,
            Shader::VrMonitor,
            Shader::VrProjectedDecals,
            Shader::VrStaticOverlay,
            Shader::SimpleWater,
            Shader::Refract,
            Shader::Cables,
            Shader::GlobalLitSimple,
        ];

        Self {
            scores: candidates.iter().map(|shader| (*shader, 0)).collect(),
        }
    }

    fn bump(&mut self, shader: Shader, delta: i32) {
        if let Some(entry) = self.scores.iter_mut().find(|(s, _)| *s == shader) {
            entry.1 += delta;
        }
    }

    fn best(&self) -> Shader {
        let mut best = self.scores[0];

        for entry in &self.scores[1..] {
            if entry.1 > best.1 {
                best = *entry;
            }
        }

        best.0
    }
}

fn param_is(params: &ParamMap, key: &str, value: &str) -> bool {
    params.get(key).map(|v| clean_value(v)) == Some(value)
}

/// Scores shader candidates for a material.
///
/// `file_name` is the forward-slashed path of the material, heuristics look
/// at the folder it lives in.
pub fn choose_shader(mat_type: &str, params: &ParamMap, file_name: &str) -> Shader {
    let Some(seeded) = material_type_shader(mat_type) else {
        // nothing sensible to convert into, black it out for visibility
        return Shader::VrBlackUnlit;
    };

    let mut scores = ScoreTable::new();
    scores.bump(seeded, 1);

    match mat_type {
        "unlitgeneric" => {
            // mostly skies, but sprites and glass also come through here
            if file_name.contains("/skybox/") {
                scores.bump(Shader::Sky, 4);
            }
            if params.contains_key("$nofog") {
                scores.bump(Shader::Sky, 1);
            }
            if params.contains_key("$ignorez") {
                scores.bump(Shader::Sky, 2);
            }
            if params.contains_key("$receiveflashlight") {
                scores.bump(Shader::Sky, -6);
            }
            if params.contains_key("$alphatest") {
                scores.bump(Shader::Sky, -6);
            }
            if params.contains_key("$additive") {
                scores.bump(Shader::Sky, -3);
            }
            if params.contains_key("$vertexcolor") {
                scores.bump(Shader::Sky, -3);
            }
        }
        "worldvertextransition" => {
            if params.contains_key("$basetexture2") {
                scores.bump(Shader::VrSimple2WayBlend, 69);
            }
        }
        "lightmappedgeneric" => {
            if param_is(params, "$newlayerblending", "1") {
                scores.bump(Shader::VrSimple2WayBlend, 69);
            }
        }
        _ => {}
    }

    scores.best()
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unknown_type_falls_back_to_black_unlit() {
        assert_eq!(
            choose_shader("shatteredglass", &params(&[]), "materials/glass/window.vmt"),
            Shader::VrBlackUnlit
        );
    }

    #[test]
    fn plain_lightmapped_is_complex() {
        assert_eq!(
            choose_shader(
                "lightmappedgeneric",
                &params(&[("$basetexture", "brick/wall")]),
                "materials/brick/wall.vmt"
            ),
            Shader::VrComplex
        );
    }

    #[test]
    fn skybox_unlit_is_sky() {
        assert_eq!(
            choose_shader(
                "unlitgeneric",
                &params(&[("$basetexture", "skybox/sky_day01_bk")]),
                "materials/skybox/sky_day01_bk.vmt"
            ),
            Shader::Sky
        );
    }

    #[test]
    fn alphatested_unlit_is_not_sky() {
        assert_eq!(
            choose_shader(
                "unlitgeneric",
                &params(&[("$nofog", "1"), ("$ignorez", "1"), ("$alphatest", "1")]),
                "materials/sprites/glow.vmt"
            ),
            Shader::VrComplex
        );
    }

    #[test]
    fn conflicting_sky_votes_resolve_by_declaration_order() {
        // +1 complex seed, +1 nofog, so sky and complex tie at 1.
        // complex is declared first and takes the tie, which keeps fogless
        // sprites and overlays from turning into sky materials.
        assert_eq!(
            choose_shader(
                "unlitgeneric",
                &params(&[("$nofog", "1")]),
                "materials/effects/flat.vmt"
            ),
            Shader::VrComplex
        );
    }

    #[test]
    fn two_way_blend_needs_second_texture() {
        assert_eq!(
            choose_shader(
                "worldvertextransition",
                &params(&[("$basetexture", "nature/grass"), ("$basetexture2", "nature/rock")]),
                "materials/nature/blend.vmt"
            ),
            Shader::VrSimple2WayBlend
        );
        assert_eq!(
            choose_shader(
                "worldvertextransition",
                &params(&[("$basetexture", "nature/grass")]),
                "materials/nature/blend.vmt"
            ),
            Shader::VrSimple2WayBlend
        );
    }

    #[test]
    fn layer_blended_lightmapped_is_two_way_blend() {
        assert_eq!(
            choose_shader(
                "lightmappedgeneric",
                &params(&[("$newlayerblending", "1")]),
                "materials/nature/blend.vmt"
            ),
            Shader::VrSimple2WayBlend
        );
    }

    #[test]
    fn recognized_material_sniffing() {
        assert!(is_recognized_material("lightmappedgeneric"));
        assert!(is_recognized_material("\"lightmappedgeneric\"\n{\n"));
        assert!(!is_recognized_material("shatteredglass"));
    }
}
