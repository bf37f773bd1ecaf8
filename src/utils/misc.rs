use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::utils::constants::{DEFAULT_TEXTURE_PREFIX, TEXTURE_FILEEXT};

// i use linux to do things
pub fn fix_backslash(i: &str) -> String {
    i.replace("\\", "/")
}

#[macro_export]
macro_rules! err {
    ($e: ident) => {{
        use eyre::eyre;

        Err(eyre!($e))
    }};

    ($format_string: literal) => {{
        use eyre::eyre;

        Err(eyre!($format_string))
    }};

    ($($arg:tt)*) => {{
        use eyre::eyre;

        Err(eyre!($($arg)*))
    }};
}

/// Turns a texture value as written in a material into a content-relative
/// path: rooted at materials/, forward slashes, lowercase, no .vtf.
///
/// `ext` is appended unless the value already ends with it.
pub fn format_vmt_texture_dir(local_path: &str, ext: &str) -> String {
    let local_path = local_path.trim().trim_matches('"');
    let ext = if !ext.is_empty() && local_path.to_lowercase().ends_with(ext) {
        ""
    } else {
        ext
    };

    fix_backslash(&format!("materials/{}{}", local_path, ext))
        .replace(".vtf", "")
        .to_lowercase()
}

/// Content-relative path to an absolute one.
pub fn format_full_dir(root: &Path, local_path: &str) -> PathBuf {
    root.join(local_path)
}

/// Absolute path back to a content-relative one with forward slashes.
pub fn format_vmat_dir(root: &Path, full_path: &Path) -> String {
    let local = full_path.strip_prefix(root).unwrap_or(full_path);

    fix_backslash(&local.display().to_string())
}

pub fn add_suffix_once(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Computes Source 2 texture paths from Source 1 texture values and keeps the
/// files on disk in sync with the computed names.
pub struct TextureRelocator<'a> {
    pub root: &'a Path,
    /// Renames the texture file to match its map type, eg `_normal`.
    pub rename_textures: bool,
    /// Deletes the .vtf next to the extracted image.
    pub remove_vtf: bool,
    /// The material being converted. Normal map materials keep their names.
    pub vmt_file_name: &'a str,
}

/// Some Source 1 names already tag the map type, just with different words.
/// The old tag is collapsed before the new one goes on, so
/// `metal_refl` becomes `metal_mask`, not `metal_refl_mask`.
const SUFFIX_ALIASES: &[(&str, &str)] = &[("mask", "refl"), ("normal", "bump")];

impl TextureRelocator<'_> {
    /// The renamed path only, no filesystem side effects.
    pub fn compute_texture_path(&self, value: &str, suffix: &str) -> String {
        self.plan(value, suffix).1
    }

    /// Computed path plus best-effort rename of the file on disk. The
    /// computed name is returned whether or not the source file exists.
    pub fn new_texture_path(&self, value: &str, suffix: &str) -> String {
        let (old_local, new_local) = self.plan(value, suffix);

        if self.remove_vtf {
            let vtf = format_full_dir(
                self.root,
                &format_vmt_texture_dir(value, "").replace(TEXTURE_FILEEXT, ""),
            )
            .with_extension("vtf");
            let _ = fs::remove_file(vtf);
        }

        if new_local != old_local {
            let old_full = format_full_dir(self.root, &old_local);
            let new_full = format_full_dir(self.root, &new_local);

            if old_full.exists() && !new_full.exists() {
                let _ = fs::rename(old_full, new_full);
            }
        }

        new_local
    }

    /// Returns (current local path, renamed local path), both with the
    /// texture file extension on.
    fn plan(&self, value: &str, suffix: &str) -> (String, String) {
        if value.is_empty() {
            let placeholder = format!("{}{}", DEFAULT_TEXTURE_PREFIX, suffix);
            return (placeholder.clone(), placeholder);
        }

        let old_local = format_vmt_texture_dir(value, TEXTURE_FILEEXT);
        let local = old_local
            .strip_suffix(TEXTURE_FILEEXT)
            .unwrap_or(&old_local)
            .to_string();

        // "_color.tga" -> "_color", ".pfm" -> ""
        let tag = if suffix.len() >= 4 {
            &suffix[..suffix.len() - 4]
        } else {
            suffix
        };

        if !self.rename_textures
            || tag.is_empty()
            || self.vmt_file_name.ends_with("_normal.vmt")
            // skybox textures get stitched by name elsewhere
            || local.contains("skybox")
        {
            return (old_local.clone(), old_local);
        }

        let (dir, old_name) = match local.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", local.as_str()),
        };

        let mut new_name = add_suffix_once(old_name, tag);

        if new_name == old_name {
            return (old_local.clone(), old_local);
        }

        for (word, alias) in SUFFIX_ALIASES {
            if tag.len() > 1 && &tag[1..] == *word && old_name.contains(alias) {
                let collapsed: String = match old_name.rsplit_once(alias) {
                    Some((head, tail)) => format!("{}{}", head, tail),
                    None => old_name.to_string(),
                };
                new_name = format!("{}{}", collapsed.trim_end_matches('_'), tag);
            }
        }

        let new_local = if dir.is_empty() {
            format!("{}{}", new_name, TEXTURE_FILEEXT)
        } else {
            format!("{}/{}{}", dir, new_name, TEXTURE_FILEEXT)
        };

        (old_local, new_local)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn relocator(root: &Path) -> TextureRelocator {
        TextureRelocator {
            root,
            rename_textures: true,
            remove_vtf: false,
            vmt_file_name: "materials/brick/wall.vmt",
        }
    }

    #[test]
    fn texture_dir_formatting() {
        assert_eq!(
            format_vmt_texture_dir("Brick\\Wall031d.vtf", TEXTURE_FILEEXT),
            "materials/brick/wall031d.tga"
        );
        assert_eq!(
            format_vmt_texture_dir("\"brick/wall031d\"", ".tga"),
            "materials/brick/wall031d.tga"
        );
    }

    #[test]
    fn suffix_added_once() {
        assert_eq!(add_suffix_once("wall_color", "_color"), "wall_color");
        assert_eq!(add_suffix_once("wall", "_color"), "wall_color");
    }

    #[test]
    fn rename_appends_map_tag() {
        let root = Path::new("/content");

        assert_eq!(
            relocator(root).compute_texture_path("brick/wall031d", "_color.tga"),
            "materials/brick/wall031d_color.tga"
        );
    }

    #[test]
    fn rename_is_stable_for_tagged_names() {
        let root = Path::new("/content");

        assert_eq!(
            relocator(root).compute_texture_path("brick/wall031d_color", "_color.tga"),
            "materials/brick/wall031d_color.tga"
        );
    }

    #[test]
    fn alias_tag_is_collapsed() {
        let root = Path::new("/content");

        assert_eq!(
            relocator(root).compute_texture_path("metal/panel_refl", "_mask.tga"),
            "materials/metal/panel_mask.tga"
        );
        assert_eq!(
            relocator(root).compute_texture_path("brick/wall_bump", "_normal.tga"),
            "materials/brick/wall_normal.tga"
        );
    }

    #[test]
    fn skybox_textures_are_not_renamed() {
        let root = Path::new("/content");

        assert_eq!(
            relocator(root).compute_texture_path("skybox/sky_day01_bk", "_color.tga"),
            "materials/skybox/sky_day01_bk.tga"
        );
    }

    #[test]
    fn empty_value_falls_back_to_placeholder() {
        let root = Path::new("/content");

        assert_eq!(
            relocator(root).compute_texture_path("", "_normal.tga"),
            "materials/default/default_normal.tga"
        );
    }

    #[test]
    fn normal_material_keeps_texture_names() {
        let root = Path::new("/content");
        let relocator = TextureRelocator {
            root,
            rename_textures: true,
            remove_vtf: false,
            vmt_file_name: "materials/brick/wall_normal.vmt",
        };

        assert_eq!(
            relocator.compute_texture_path("brick/wall031d", "_color.tga"),
            "materials/brick/wall031d.tga"
        );
    }
}
