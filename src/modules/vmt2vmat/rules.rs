//! The Source 1 to Source 2 parameter rule table.
//!
//! One row per legacy parameter, in a fixed order. Lookups are linear, the
//! table is small and declaration order doubles as documentation.

use lazy_static::lazy_static;

/// Rewrite applied to the legacy value before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    FloatFormat,
    InvertBool,
    InvertBoolFloat,
    ColorVector,
    DetailScale,
    DetailBlendModeRemap,
}

#[derive(Debug, Clone, Copy)]
pub struct Entry {
    /// Source 2 parameter name. Empty means the row is recognized but
    /// produces nothing.
    pub replacement: &'static str,
    /// Default value, or default texture suffix for texture rows.
    pub default: &'static str,
    /// Extra lines emitted alongside the parameter, mostly feature flags.
    pub extra: &'static str,
    pub transform: Option<ValueTransform>,
}

impl Entry {
    const fn texture(replacement: &'static str, suffix: &'static str, extra: &'static str) -> Self {
        Self {
            replacement,
            default: suffix,
            extra,
            transform: None,
        }
    }

    const fn setting(
        replacement: &'static str,
        default: &'static str,
        extra: &'static str,
        transform: Option<ValueTransform>,
    ) -> Self {
        Self {
            replacement,
            default,
            extra,
            transform,
        }
    }
}

/// Where a channel-derived mask pulls its pixels from.
#[derive(Debug, Clone, Copy)]
pub enum MaskSource {
    Key(&'static str),
    /// First normal map parameter that is set.
    NormalMaps,
}

pub const NORMAL_MAP_KEYS: &[&str] = &["$normalmap", "$bumpmap", "$bumpmap2"];

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Texture(Entry),
    TexTransform(Entry),
    Setting(Entry),
    Flag(Entry),
    /// Derives a grayscale texture from one channel of another texture and
    /// registers it under `produces`.
    Mask {
        produces: &'static str,
        source: MaskSource,
        channel: &'static str,
    },
    SurfaceProp,
    /// Recognized but has no Source 2 counterpart. Emits a comment unless
    /// `silent`.
    NoOp { silent: bool },
}

lazy_static! {
    pub static ref RULES: Vec<(&'static str, Rule)> = vec![
        // textures
        (
            "$hdrcompressedtexture",
            Rule::Texture(Entry::texture("SkyTexture", ".pfm", "F_TEXTURE_FORMAT2 6")),
        ),
        ("$hdrbasetexture", Rule::Texture(Entry::texture("SkyTexture", ".pfm", ""))),
        ("$basetexture", Rule::Texture(Entry::texture("TextureColor", "_color.tga", ""))),
        ("$painttexture", Rule::Texture(Entry::texture("TextureColor", "_color.tga", ""))),
        ("$bumpmap", Rule::Texture(Entry::texture("TextureNormal", "_normal.tga", ""))),
        ("$normalmap", Rule::Texture(Entry::texture("TextureNormal", "_normal.tga", ""))),
        ("$basetexture2", Rule::Texture(Entry::texture("TextureColorB", "_color.tga", ""))),
        ("$bumpmap2", Rule::Texture(Entry::texture("TextureNormalB", "_normal.tga", ""))),
        ("$basetexture3", Rule::Texture(Entry::texture("TextureLayer2Color", "_color.tga", ""))),
        ("$basetexture4", Rule::Texture(Entry::texture("TextureLayer3Color", "_color.tga", ""))),
        (
            "$blendmodulatetexture",
            Rule::Texture(Entry::texture("TextureMask", "_mask.tga", "F_BLEND 1")),
        ),
        (
            "$normalmap2",
            Rule::Texture(Entry::texture("TextureNormal2", "_normal.tga", "F_SECONDARY_NORMAL 1")),
        ),
        (
            "$flowmap",
            Rule::Texture(Entry::texture("TextureFlow", ".tga", "F_FLOW_NORMALS 1\n\tF_FLOW_DEBUG 1")),
        ),
        (
            "$flow_noise_texture",
            Rule::Texture(Entry::texture(
                "TextureNoise",
                "_noise.tga",
                "F_FLOW_NORMALS 1\n\tF_FLOW_DEBUG 2",
            )),
        ),
        ("$detail", Rule::Texture(Entry::texture("TextureDetail", "_detail.tga", "F_DETAIL_TEXTURE 1\n"))),
        (
            "$decaltexture",
            Rule::Texture(Entry::texture("TextureDetail", "_detail.tga", "F_DETAIL_TEXTURE 1\n")),
        ),
        ("$tintmasktexture", Rule::Texture(Entry::texture("TextureTintMask", "_mask.tga", "F_TINT_MASK 1"))),
        ("$selfillummask", Rule::Texture(Entry::texture("TextureSelfIllumMask", "_selfillummask.tga", ""))),
        (
            "$envmap",
            Rule::Texture(Entry::texture(
                "TextureCubeMap",
                "_cube.pfm",
                "F_SPECULAR 1\n\tF_SPECULAR_CUBE_MAP 1\n\tF_SPECULAR_CUBE_MAP_PROJECTION 1\n\tg_flCubeMapBlurAmount \"1.000\"\n\tg_flCubeMapScalar \"1.000\"\n\tg_vReflectanceRange \"[0.000 0.600]\"\n",
            )),
        ),
        ("$envmapmask", Rule::Texture(Entry::texture("TextureReflectance", "_refl.tga", ""))),
        (
            "$phong",
            Rule::Texture(Entry::texture(
                "TextureReflectance",
                "_refl.tga",
                "g_vReflectanceRange \"[0.000 0.600]\"\n",
            )),
        ),
        ("$translucent", Rule::Texture(Entry::texture("TextureTranslucency", "_trans.tga", "F_TRANSLUCENT 1\n"))),
        ("$alphatest", Rule::Texture(Entry::texture("TextureTranslucency", "_trans.tga", "F_ALPHA_TEST 1\n"))),
        (
            "$ao",
            Rule::Texture(Entry::texture(
                "TextureAmbientOcclusion",
                "_ao.tga",
                "g_flAmbientOcclusionDirectSpecular \"1.000\"\n\tF_AMBIENT_OCCLUSION_TEXTURE 1\n",
            )),
        ),
        (
            "$aotexture",
            Rule::Texture(Entry::texture(
                "TextureAmbientOcclusion",
                "_ao.tga",
                "g_flAmbientOcclusionDirectSpecular \"1.000\"\n\tF_AMBIENT_OCCLUSION_TEXTURE 1\n",
            )),
        ),
        // texture coordinate transforms
        ("$basetexturetransform", Rule::TexTransform(Entry::setting("g_vTex", "", "", None))),
        ("$detailtexturetransform", Rule::TexTransform(Entry::setting("g_vDetailTex", "", "", None))),
        ("$bumptransform", Rule::TexTransform(Entry::setting("g_vNormalTex", "", "", None))),
        ("$basetexturetransform2", Rule::TexTransform(Entry::setting("", "", "", None))),
        ("$texture2transform", Rule::TexTransform(Entry::setting("", "", "", None))),
        ("$blendmasktransform", Rule::TexTransform(Entry::setting("", "", "", None))),
        ("$bumptransform2", Rule::TexTransform(Entry::setting("", "", "", None))),
        ("$envmapmasktransform", Rule::TexTransform(Entry::setting("", "", "", None))),
        ("$envmapmasktransform2", Rule::TexTransform(Entry::setting("", "", "", None))),
        // settings
        (
            "$detailscale",
            Rule::Setting(Entry::setting(
                "g_vDetailTexCoordScale",
                "[1.000 1.000]",
                "",
                Some(ValueTransform::DetailScale),
            )),
        ),
        (
            "$detailblendfactor",
            Rule::Setting(Entry::setting("g_flDetailBlendFactor", "1.000", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$selfillumscale",
            Rule::Setting(Entry::setting("g_flSelfIllumScale", "1.000", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$selfillumtint",
            Rule::Setting(Entry::setting(
                "g_vSelfIllumTint",
                "[1.000 1.000 1.000 0.000]",
                "",
                Some(ValueTransform::ColorVector),
            )),
        ),
        (
            "$phongexponent",
            Rule::Setting(Entry::setting("TextureRoughness", "[0.823 0.823 0.823 1.000]", "", None)),
        ),
        (
            "$phongexponent2",
            Rule::Setting(Entry::setting("TextureRoughnessB", "[0.823 0.823 0.823 1.000]", "", None)),
        ),
        (
            "$color",
            Rule::Setting(Entry::setting(
                "g_vColorTint",
                "[1.000 1.000 1.000 0.000]",
                "",
                Some(ValueTransform::ColorVector),
            )),
        ),
        (
            "$blendtintcoloroverbase",
            Rule::Setting(Entry::setting("g_flModelTintAmount", "1.000", "", Some(ValueTransform::FloatFormat))),
        ),
        ("$surfaceprop", Rule::SurfaceProp),
        (
            "$alpha",
            Rule::Setting(Entry::setting("g_flOpacityScale", "1.000", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$alphatestreference",
            Rule::Setting(Entry::setting(
                "g_flAlphaTestReference",
                "0.500",
                "g_flAntiAliasedEdgeStrength \"1.000\"",
                Some(ValueTransform::FloatFormat),
            )),
        ),
        (
            "$nofog",
            Rule::Setting(Entry::setting("g_bFogEnabled", "0", "", Some(ValueTransform::InvertBool))),
        ),
        (
            "$notint",
            Rule::Setting(Entry::setting("g_flModelTintAmount", "1.000", "", Some(ValueTransform::InvertBoolFloat))),
        ),
        (
            "$refractamount",
            Rule::Setting(Entry::setting("g_flRefractScale", "0.200", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$flow_worlduvscale",
            Rule::Setting(Entry::setting("g_flWorldUvScale", "1.000", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$flow_noise_scale",
            Rule::Setting(Entry::setting("g_flNoiseUvScale", "0.010", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$flow_bumpstrength",
            Rule::Setting(Entry::setting("g_flNormalMapStrength", "1.000", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$blendsoftness",
            Rule::Setting(Entry::setting("g_flLayer1BlendSoftness", "0.500", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$layerborderstrenth",
            Rule::Setting(Entry::setting("g_flLayer1BorderStrength", "0.500", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$layerborderoffset",
            Rule::Setting(Entry::setting("g_flLayer1BorderOffset", "0.000", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$layerbordersoftness",
            Rule::Setting(Entry::setting("g_flLayer1BorderSoftness", "0.500", "", Some(ValueTransform::FloatFormat))),
        ),
        (
            "$layerbordertint",
            Rule::Setting(Entry::setting(
                "g_vLayer1BorderColor",
                "[1.000000 1.000000 1.000000 0.000000]",
                "",
                Some(ValueTransform::ColorVector),
            )),
        ),
        // feature flags
        ("$selfillum", Rule::Flag(Entry::setting("F_SELF_ILLUM", "1", "", None))),
        ("$additive", Rule::Flag(Entry::setting("F_ADDITIVE_BLEND", "1", "", None))),
        ("$nocull", Rule::Flag(Entry::setting("F_RENDER_BACKFACES", "1", "", None))),
        ("$decal", Rule::Flag(Entry::setting("F_OVERLAY", "1", "", None))),
        ("$flow_debug", Rule::Flag(Entry::setting("F_FLOW_DEBUG", "0", "", None))),
        (
            "$detailblendmode",
            Rule::Flag(Entry::setting("F_DETAIL_TEXTURE", "1", "", Some(ValueTransform::DetailBlendModeRemap))),
        ),
        (
            "$decalblendmode",
            Rule::Flag(Entry::setting("F_DETAIL_TEXTURE", "1", "", Some(ValueTransform::DetailBlendModeRemap))),
        ),
        // channel-derived masks
        (
            "$normalmapalphaenvmapmask",
            Rule::Mask { produces: "$envmapmask", source: MaskSource::NormalMaps, channel: "M_1-A" },
        ),
        (
            "$basealphaenvmapmask",
            Rule::Mask { produces: "$envmapmask", source: MaskSource::Key("$basetexture"), channel: "M_1-A" },
        ),
        (
            "$envmapmaskintintmasktexture",
            Rule::Mask { produces: "$envmapmask", source: MaskSource::Key("$tintmasktexture"), channel: "R" },
        ),
        (
            "$basemapalphaphongmask",
            Rule::Mask { produces: "$phong", source: MaskSource::Key("$basetexture"), channel: "A" },
        ),
        (
            "$basealphaphongmask",
            Rule::Mask { produces: "$phong", source: MaskSource::Key("$basetexture"), channel: "A" },
        ),
        (
            "$normalmapalphaphongmask",
            Rule::Mask { produces: "$phong", source: MaskSource::NormalMaps, channel: "A" },
        ),
        (
            "$bumpmapalphaphongmask",
            Rule::Mask { produces: "$phong", source: MaskSource::NormalMaps, channel: "A" },
        ),
        (
            "$blendtintbybasealpha",
            Rule::Mask { produces: "$tintmasktexture", source: MaskSource::Key("$basetexture"), channel: "A" },
        ),
        (
            "$selfillum_envmapmask_alpha",
            Rule::Mask { produces: "$selfillummask", source: MaskSource::Key("$envmap"), channel: "1-A" },
        ),
        // recognized, no counterpart
        ("$ssbump", Rule::NoOp { silent: true }),
        ("$newlayerblending", Rule::NoOp { silent: false }),
        ("$iris", Rule::NoOp { silent: false }),
        ("$maskstexture", Rule::NoOp { silent: false }),
        ("$masks", Rule::NoOp { silent: false }),
        ("$masks1", Rule::NoOp { silent: false }),
        ("$masks2", Rule::NoOp { silent: false }),
    ];
}

pub fn lookup(key: &str) -> Option<&'static Rule> {
    RULES.iter().find(|(k, _)| *k == key).map(|(_, rule)| rule)
}

pub fn texture_entry(key: &str) -> Option<&'static Entry> {
    match lookup(key) {
        Some(Rule::Texture(entry)) => Some(entry),
        _ => None,
    }
}

/// Keys whose mask rule registers a texture under `target`.
pub fn mask_keys_producing(target: &str) -> Vec<&'static str> {
    RULES
        .iter()
        .filter_map(|(key, rule)| match rule {
            Rule::Mask { produces, .. } if *produces == target => Some(*key),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_finds_texture_rows() {
        assert!(matches!(lookup("$basetexture"), Some(Rule::Texture(_))));
        assert!(matches!(lookup("$surfaceprop"), Some(Rule::SurfaceProp)));
        assert!(lookup("$bogus").is_none());
    }

    #[test]
    fn phong_mask_producers() {
        let keys = mask_keys_producing("$phong");

        assert_eq!(
            keys,
            vec![
                "$basemapalphaphongmask",
                "$basealphaphongmask",
                "$normalmapalphaphongmask",
                "$bumpmapalphaphongmask",
            ]
        );
    }

    #[test]
    fn table_keys_are_unique() {
        for (idx, (key, _)) in RULES.iter().enumerate() {
            assert!(
                !RULES[idx + 1..].iter().any(|(other, _)| other == key),
                "duplicate rule for {}",
                key
            );
        }
    }
}
