//! Value rewrites between Source 1 and Source 2 parameter formats.

fn clean_number(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}

/// Numeric scalars get six decimals, which is what the material editor
/// itself writes.
pub fn format_float(value: &str) -> Option<String> {
    clean_number(value)
        .parse::<f64>()
        .ok()
        .map(|v| format!("{:.6}", v))
}

/// "0" becomes "1" and anything non-zero becomes "0".
pub fn invert_bool(value: &str) -> Option<String> {
    clean_number(value)
        .parse::<f64>()
        .ok()
        .map(|v| if v == 0. { "1".to_string() } else { "0".to_string() })
}

pub fn invert_bool_float(value: &str) -> Option<String> {
    clean_number(value)
        .parse::<f64>()
        .ok()
        .map(|v| if v == 0. { "1.000".to_string() } else { "0.000".to_string() })
}

/// Rewrites a Source 1 vector into bracketed six-decimal form.
///
/// Braced vectors with at least three components are 0-255 colors and get
/// scaled into 0-1. A bare scalar is replicated `replicate` extra times.
/// With `needs_alpha` a fourth component of 1 goes on when none is present.
pub fn fix_vector(value: &str, needs_alpha: bool, replicate: usize) -> Option<String> {
    let braced_color = value.contains('{') && value.contains('}');
    let bare_scalar = !value.contains('[') && !value.contains(']') && !braced_color;

    let inner = value
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .trim_matches(|c: char| "[]{}".contains(c));

    let mut components = vec![];
    for piece in inner.split_whitespace() {
        components.push(piece.parse::<f64>().ok()?);
    }

    if components.is_empty() {
        return None;
    }

    if bare_scalar && components.len() == 1 {
        for _ in 0..replicate {
            components.push(components[0]);
        }
    }

    let scale_color = braced_color && components.len() >= 3;

    if needs_alpha && components.len() < 4 {
        components.push(1.);
    }

    let formatted: Vec<String> = components
        .iter()
        .enumerate()
        .map(|(idx, v)| {
            let v = if scale_color && idx < 3 { v / 255. } else { *v };
            format!("{:.6}", v)
        })
        .collect();

    Some(format!("[{}]", formatted.join(" ")))
}

/// The seven components of `$basetexturetransform` and friends:
/// `center .5 .5 scale 1 1 rotate 0 translate 0 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub center: [f64; 2],
    pub scale: [f64; 2],
    pub rotate: f64,
    pub translate: [f64; 2],
}

impl TextureTransform {
    pub fn parse(value: &str) -> Option<Self> {
        let numbers: Vec<f64> = value
            .trim_matches(|c: char| c == '"' || c == '\'')
            .split_whitespace()
            .filter_map(|piece| piece.parse().ok())
            .collect();

        if numbers.len() < 7 {
            return None;
        }

        Some(Self {
            center: [numbers[0], numbers[1]],
            scale: [numbers[2], numbers[3]],
            rotate: numbers[4],
            translate: [numbers[5], numbers[6]],
        })
    }

    pub fn scale_str(&self) -> String {
        format!("[{:.3} {:.3}]", self.scale[0], self.scale[1])
    }

    pub fn translate_str(&self) -> String {
        format!("[{:.3} {:.3}]", self.translate[0], self.translate[1])
    }

    pub fn is_identity_scale(&self) -> bool {
        self.scale_str() == "[1.000 1.000]"
    }

    pub fn is_zero_translate(&self) -> bool {
        self.translate_str() == "[0.000 0.000]"
    }
}

/// `$detailblendmode` values that have a vr_complex counterpart.
pub fn remap_detail_blend_mode(value: &str) -> &'static str {
    match clean_number(value) {
        // mod2x
        "0" => "1",
        // additive
        "1" => "2",
        // lighten
        "12" => "0",
        _ => "1",
    }
}

/// Surface names that exist as-is in Source 2.
const SURFACEPROP_PASSTHROUGH: &[&str] = &[
    "default",
    "default_silent",
    "no_decal",
    "player",
    "roller",
    "weapon",
];

const SURFACEPROP_REPLACEMENTS: &[(&str, &str)] = &[
    ("stucco", "world.drywall"),
    ("tile", "world.tile_floor"),
    ("metalpanel", "world.metal_panel"),
    ("wood", "world.wood_solid"),
];

/// Known HL:Alyx surface vocabulary for fuzzy fallback matching.
const SURFACEPROP_VOCABULARY: &[&str] = &[
    "world.concrete",
    "world.drywall",
    "world.metal_panel",
    "world.tile_floor",
    "world.wood_solid",
    "world.plaster",
    "world.brick",
    "world.dirt",
    "world.grass",
    "world.gravel",
    "world.sand",
    "world.snow",
    "world.mud",
    "world.glass",
    "world.metal_grate",
    "world.metal_sheet",
    "world.chainlink",
    "world.cardboard",
    "world.carpet",
    "world.plastic",
    "world.rubber",
    "world.water",
    "world.ice",
    "prop.metal",
    "prop.wood",
    "prop.plastic",
    "prop.glass",
    "prop.flesh",
    "prop.cloth",
    "prop.paper",
    "prop.rubber",
];

/// Longest common subsequence similarity, 0 to 1.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    2. * prev[b.len()] as f64 / (a.len() + b.len()) as f64
}

fn closest_match<'a>(query: &str, vocabulary: &[&'a str], cutoff: f64) -> Option<&'a str> {
    vocabulary
        .iter()
        .map(|candidate| (candidate, similarity(query, candidate)))
        .filter(|(_, score)| *score > cutoff)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(candidate, _)| *candidate)
}

/// Maps a `$surfaceprop` value onto the Source 2 surface vocabulary.
///
/// Exact passthroughs and known replacements first, then a fuzzy search
/// seeded with `prop.` for prop materials and `world.` otherwise. An
/// unmatched value passes through untouched.
pub fn map_surface_prop(value: &str, is_prop_material: bool) -> String {
    let value = value.to_lowercase();

    if SURFACEPROP_PASSTHROUGH.contains(&value.as_str()) {
        return value;
    }

    if let Some((_, replacement)) = SURFACEPROP_REPLACEMENTS
        .iter()
        .find(|(old, _)| *old == value)
    {
        return replacement.to_string();
    }

    let matched = if is_prop_material {
        closest_match(&format!("prop.{}", value), SURFACEPROP_VOCABULARY, 0.4)
    } else {
        closest_match(&format!("world.{}", value), SURFACEPROP_VOCABULARY, 0.6)
            .or_else(|| closest_match(&value, SURFACEPROP_VOCABULARY, 0.6))
    };

    matched.map(|m| m.to_string()).unwrap_or(value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn float_formatting() {
        assert_eq!(format_float("0.5"), Some("0.500000".to_string()));
        assert_eq!(format_float("\".25\""), Some("0.250000".to_string()));
        assert_eq!(format_float("banana"), None);
    }

    #[test]
    fn bool_inversion() {
        assert_eq!(invert_bool("0"), Some("1".to_string()));
        assert_eq!(invert_bool("1"), Some("0".to_string()));
        assert_eq!(invert_bool_float("0"), Some("1.000".to_string()));
        assert_eq!(invert_bool_float("2"), Some("0.000".to_string()));
    }

    #[test]
    fn braced_color_is_scaled_and_gets_alpha() {
        assert_eq!(
            fix_vector("{255 128 0}", true, 0),
            Some("[1.000000 0.501961 0.000000 1.000000]".to_string())
        );
    }

    #[test]
    fn bracketed_vector_is_not_scaled() {
        assert_eq!(
            fix_vector("[1 .5 0]", true, 0),
            Some("[1.000000 0.500000 0.000000 1.000000]".to_string())
        );
    }

    #[test]
    fn two_component_braced_vector_is_not_color_scaled() {
        assert_eq!(
            fix_vector("{4 4}", false, 0),
            Some("[4.000000 4.000000]".to_string())
        );
    }

    #[test]
    fn existing_alpha_is_kept() {
        assert_eq!(
            fix_vector("[1 1 1 .5]", true, 0),
            Some("[1.000000 1.000000 1.000000 0.500000]".to_string())
        );
    }

    #[test]
    fn scalar_replication() {
        assert_eq!(
            fix_vector("10", false, 1),
            Some("[10.000000 10.000000]".to_string())
        );
    }

    #[test]
    fn malformed_vector_is_rejected() {
        assert_eq!(fix_vector("[1 banana]", false, 0), None);
        assert_eq!(fix_vector("", false, 0), None);
    }

    #[test]
    fn texture_transform_parsing() {
        let transform =
            TextureTransform::parse("\"center .5 .5 scale 2 1 rotate 45 translate 0 .25\"")
                .unwrap();

        assert_eq!(transform.scale_str(), "[2.000 1.000]");
        assert_eq!(transform.translate_str(), "[0.000 0.250]");
        assert_eq!(transform.rotate, 45.);
        assert!(!transform.is_identity_scale());
        assert!(!transform.is_zero_translate());
    }

    #[test]
    fn identity_transform_detection() {
        let transform =
            TextureTransform::parse("center .5 .5 scale 1 1 rotate 0 translate 0 0").unwrap();

        assert!(transform.is_identity_scale());
        assert!(transform.is_zero_translate());
    }

    #[test]
    fn short_transform_is_rejected() {
        assert_eq!(TextureTransform::parse("center .5 .5 scale 1 1"), None);
    }

    #[test]
    fn detail_blend_mode_remap() {
        assert_eq!(remap_detail_blend_mode("0"), "1");
        assert_eq!(remap_detail_blend_mode("1"), "2");
        assert_eq!(remap_detail_blend_mode("12"), "0");
        assert_eq!(remap_detail_blend_mode("7"), "1");
    }

    #[test]
    fn surface_prop_passthrough_and_replacement() {
        assert_eq!(map_surface_prop("default", false), "default");
        assert_eq!(map_surface_prop("metalpanel", false), "world.metal_panel");
        assert_eq!(map_surface_prop("Tile", false), "world.tile_floor");
    }

    #[test]
    fn surface_prop_fuzzy_match() {
        assert_eq!(map_surface_prop("concrete", false), "world.concrete");
        assert_eq!(map_surface_prop("metal", true), "prop.metal");
    }

    #[test]
    fn unknown_surface_prop_passes_through() {
        assert_eq!(map_surface_prop("xyzzy", false), "xyzzy");
    }
}
