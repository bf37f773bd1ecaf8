use std::path::{Path, PathBuf};

use eyre::eyre;
use image::{GrayImage, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskChannel {
    R,
    G,
    B,
    A,
}

impl MaskChannel {
    pub fn index(&self) -> usize {
        match self {
            MaskChannel::R => 0,
            MaskChannel::G => 1,
            MaskChannel::B => 2,
            MaskChannel::A => 3,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            MaskChannel::R => 'R',
            MaskChannel::G => 'G',
            MaskChannel::B => 'B',
            MaskChannel::A => 'A',
        }
    }
}

/// Whether a derived mask needs its values flipped. Source 1 shaders disagree
/// between world and model materials on which direction a mask reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvertPolicy {
    Never,
    Always,
    /// Inverts only when the material is not under models/.
    NonModelOnly,
}

impl InvertPolicy {
    pub fn applies(&self, is_model_surface: bool) -> bool {
        match self {
            InvertPolicy::Never => false,
            InvertPolicy::Always => true,
            InvertPolicy::NonModelOnly => !is_model_surface,
        }
    }
}

/// Channel pull spec, written as `A`, `1-A` (flipped) or `M_1-A` (flipped
/// unless the material is a model surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub channel: MaskChannel,
    pub invert: InvertPolicy,
}

impl ChannelSpec {
    pub fn parse(spec: &str) -> Option<Self> {
        let (invert, rest) = if let Some(rest) = spec.strip_prefix("M_1-") {
            (InvertPolicy::NonModelOnly, rest)
        } else if let Some(rest) = spec.strip_prefix("1-") {
            (InvertPolicy::Always, rest)
        } else {
            (InvertPolicy::Never, spec)
        };

        let channel = match rest {
            "R" => MaskChannel::R,
            "G" => MaskChannel::G,
            "B" => MaskChannel::B,
            "A" => MaskChannel::A,
            _ => return None,
        };

        Some(Self { channel, invert })
    }
}

pub enum MaskOutput {
    /// Grayscale image written next to its source.
    Path(PathBuf),
    /// The source channel was one flat value, a constant beats a texture.
    Uniform(f64),
}

/// `panel.tga` pulled on an inverted A with suffix `_mask.tga` becomes
/// `panel_A-1_mask.tga`.
pub fn derived_mask_path(
    texture: &Path,
    channel: MaskChannel,
    invert: bool,
    suffix: &str,
) -> PathBuf {
    let full = texture.display().to_string();
    let stem = full.rsplit_once('.').map(|(s, _)| s).unwrap_or(&full);

    PathBuf::from(format!(
        "{}_{}{}{}",
        stem,
        channel.letter(),
        if invert { "-1" } else { "" },
        suffix
    ))
}

fn uniform_channel(img: &RgbaImage, channel: MaskChannel) -> Option<u8> {
    let mut pixels = img.pixels().map(|p| p.0[channel.index()]);
    let first = pixels.next()?;

    pixels.all(|v| v == first).then_some(first)
}

/// Extracts one channel of `texture` into a grayscale image next to it.
///
/// Short-circuits to the already-derived file when it exists and to a flat
/// value when the source channel carries no detail.
pub fn create_mask_from_channel(
    texture: &Path,
    channel: MaskChannel,
    invert: bool,
    suffix: &str,
) -> eyre::Result<MaskOutput> {
    let mask_path = derived_mask_path(texture, channel, invert, suffix);

    if mask_path.exists() {
        return Ok(MaskOutput::Path(mask_path));
    }

    let img = image::open(texture)?.to_rgba8();

    if let Some(value) = uniform_channel(&img, channel) {
        let value = value as f64 / 255.;

        return Ok(MaskOutput::Uniform(if invert { 1. - value } else { value }));
    }

    let (width, height) = img.dimensions();
    let buf: Vec<u8> = img
        .pixels()
        .map(|p| {
            let v = p.0[channel.index()];
            if invert {
                255 - v
            } else {
                v
            }
        })
        .collect();

    let mask = GrayImage::from_vec(width, height, buf)
        .ok_or_else(|| eyre!("channel buffer does not match image dimensions"))?;

    mask.save(&mask_path)?;

    Ok(MaskOutput::Path(mask_path))
}

/// Source 1 normal maps have their green channel flipped. Instead of editing
/// pixels, a sibling settings file tells the importer to flip on compile.
pub fn write_normal_flip_settings(texture: &Path) -> eyre::Result<()> {
    let settings_path = texture.with_extension("txt");

    std::fs::write(
        settings_path,
        "\"settings\"\n{\n\t\"legacy_source1_inverted_normal\" \"1\"\n}\n",
    )?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgba;

    #[test]
    fn channel_spec_parsing() {
        assert_eq!(
            ChannelSpec::parse("A"),
            Some(ChannelSpec {
                channel: MaskChannel::A,
                invert: InvertPolicy::Never
            })
        );
        assert_eq!(
            ChannelSpec::parse("1-A"),
            Some(ChannelSpec {
                channel: MaskChannel::A,
                invert: InvertPolicy::Always
            })
        );
        assert_eq!(
            ChannelSpec::parse("M_1-A"),
            Some(ChannelSpec {
                channel: MaskChannel::A,
                invert: InvertPolicy::NonModelOnly
            })
        );
        assert_eq!(ChannelSpec::parse("X"), None);
    }

    #[test]
    fn invert_policy_for_model_surfaces() {
        assert!(!InvertPolicy::Never.applies(false));
        assert!(InvertPolicy::Always.applies(true));
        assert!(InvertPolicy::NonModelOnly.applies(false));
        assert!(!InvertPolicy::NonModelOnly.applies(true));
    }

    #[test]
    fn derived_mask_naming() {
        assert_eq!(
            derived_mask_path(
                Path::new("materials/metal/panel.tga"),
                MaskChannel::A,
                true,
                "_mask.tga"
            ),
            PathBuf::from("materials/metal/panel_A-1_mask.tga")
        );
        assert_eq!(
            derived_mask_path(
                Path::new("materials/metal/panel.tga"),
                MaskChannel::G,
                false,
                "_trans.tga"
            ),
            PathBuf::from("materials/metal/panel_G_trans.tga")
        );
    }

    #[test]
    fn uniform_channel_detection() {
        let mut img = RgbaImage::new(2, 2);
        for p in img.pixels_mut() {
            *p = Rgba([10, 20, 30, 255]);
        }

        assert_eq!(uniform_channel(&img, MaskChannel::R), Some(10));

        img.put_pixel(0, 0, Rgba([11, 20, 30, 255]));

        assert_eq!(uniform_channel(&img, MaskChannel::R), None);
        assert_eq!(uniform_channel(&img, MaskChannel::G), Some(20));
    }
}
