//! Converts Source 1 `.vmt` materials into Source 2 `.vmat` documents.
//!
//! One material in, one document out. Textures referenced by the material
//! get renamed to carry their map type, and a few mask textures are derived
//! from channels of other textures along the way.

use std::{
    fs,
    path::{Path, PathBuf},
};

use vmt::{clean_value, ParamMap, VmtMaterial};
use walkdir::WalkDir;

use crate::err;
use crate::utils::{
    constants::{
        DEFAULT_TEXTURE_PREFIX, MATERIALS_DIR, PAINTS_MASTER_INCLUDE, SKIP_FOLDERS,
        SKYBOX_DIR_MARKER, SKYBOX_FACES, TEXTURE_FILEEXT, VMAT_EXTENSION, VMT_EXTENSION,
        WEAPON_CUSTOMIZATION_DIR, WEAPON_VMODELS_MARKER,
    },
    img_stuffs::{self, ChannelSpec, MaskOutput},
    misc::{
        fix_backslash, format_full_dir, format_vmat_dir, format_vmt_texture_dir, TextureRelocator,
    },
};

mod rules;
mod shader;
mod transform;

pub use shader::Shader;

use rules::{Entry, MaskSource, Rule, ValueTransform, NORMAL_MAP_KEYS};
use shader::{choose_shader, is_recognized_material};
use transform::{
    fix_vector, format_float, invert_bool, invert_bool_float, map_surface_prop,
    remap_detail_blend_mode, TextureTransform,
};

#[derive(Debug, Clone)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ConversionSummary {
    pub converted: Vec<PathBuf>,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

#[derive(Debug, Clone)]
pub struct Vmt2VmatOptions {
    /// Writes over an existing .vmat
    pub overwrite_vmat: bool,
    /// Renames textures on disk to carry their map type, eg `_color`
    pub rename_textures: bool,
    /// Deletes the .vtf after its extracted image is relocated
    pub remove_vtf: bool,
}

impl Default for Vmt2VmatOptions {
    fn default() -> Self {
        Self {
            overwrite_vmat: true,
            rename_textures: true,
            remove_vtf: false,
        }
    }
}

pub struct Vmt2Vmat {
    path: PathBuf,
    options: Vmt2VmatOptions,
}

impl Vmt2Vmat {
    /// `path` is either a content root holding a materials/ folder or one
    /// .vmt file.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            options: Vmt2VmatOptions::default(),
        }
    }

    pub fn overwrite_vmat(&mut self, overwrite_vmat: bool) -> &mut Self {
        self.options.overwrite_vmat = overwrite_vmat;
        self
    }

    pub fn rename_textures(&mut self, rename_textures: bool) -> &mut Self {
        self.options.rename_textures = rename_textures;
        self
    }

    pub fn remove_vtf(&mut self, remove_vtf: bool) -> &mut Self {
        self.options.remove_vtf = remove_vtf;
        self
    }

    fn log_info(&self, what: &str) {
        println!("{}", what);
    }

    fn log_err(&self, what: &str) {
        eprintln!("{}", what);
    }

    pub fn work(&mut self) -> eyre::Result<ConversionSummary> {
        self.log_info("Validating input path");

        if !self.path.exists() {
            return err!("{} does not exist", self.path.display());
        }

        let (root, files) = if self.path.is_file() {
            if self.path.extension().is_none_or(|ext| ext != VMT_EXTENSION) {
                return err!("{} is not a .vmt file", self.path.display());
            }

            (content_root_for(&self.path), vec![self.path.clone()])
        } else {
            (self.path.clone(), collect_vmt_files(&self.path))
        };

        self.log_info(format!("Found ({}) material(s)", files.len()).as_str());

        let mut summary = ConversionSummary::default();

        for file in &files {
            self.convert_file(file, &root, &mut summary);
        }

        self.log_info(
            format!(
                "Converted ({}) material(s), skipped ({})",
                summary.converted.len(),
                summary.skipped
            )
            .as_str(),
        );

        for failure in &summary.failures {
            self.log_err(format!("{}: {}", failure.path.display(), failure.reason).as_str());
        }

        Ok(summary)
    }

    fn convert_file(&self, vmt_path: &Path, root: &Path, summary: &mut ConversionSummary) {
        self.log_info(format!("Converting {}", vmt_path.display()).as_str());

        let mut material = match VmtMaterial::from_file(vmt_path) {
            Ok(material) => material,
            Err(err) => {
                summary.failures.push(Failure {
                    path: vmt_path.to_path_buf(),
                    reason: err.to_string(),
                });
                return;
            }
        };

        let file_name = fix_backslash(&vmt_path.display().to_string());
        let mut valid = is_recognized_material(&material.mat_type);

        if material.mat_type == "patch" {
            match material.clean_param("include").map(fix_backslash) {
                Some(include) => {
                    // weapon skins have nothing of their own to convert
                    if include == PAINTS_MASTER_INCLUDE {
                        summary.skipped += 1;
                        return;
                    }

                    match fs::read_to_string(format_full_dir(root, &include)) {
                        Ok(text) => {
                            if !is_recognized_material(&text.to_lowercase()) {
                                self.log_err(
                                    format!("Patch base {} is not a recognized material", include)
                                        .as_str(),
                                );
                            }

                            material.merge_over_base(VmtMaterial::from_text(&text));
                        }
                        Err(err) => {
                            summary.failures.push(Failure {
                                path: vmt_path.to_path_buf(),
                                reason: format!("cannot read patch base {}: {}", include, err),
                            });
                            summary.skipped += 1;
                            return;
                        }
                    }
                }
                None => self.log_err(
                    format!("Patch material {} has no include", vmt_path.display()).as_str(),
                ),
            }
        }

        let mut shader = choose_shader(&material.mat_type, &material.params, &file_name);
        let mut vmat_path = vmt_path.with_extension(VMAT_EXTENSION);

        // a skybox is six materials but one Source 2 asset. the bk face
        // carries the conversion, the rest are dropped.
        if file_name.contains(SKYBOX_DIR_MARKER) {
            if let Some(stem) = vmt_path.file_stem().and_then(|stem| stem.to_str()) {
                if stem.len() > 2 && stem.is_char_boundary(stem.len() - 2) {
                    let (name, face) = stem.split_at(stem.len() - 2);

                    if SKYBOX_FACES.contains(&face) {
                        shader = Shader::Sky;
                        vmat_path = vmt_path.with_file_name(format!(
                            "{}.{}",
                            name.trim_end_matches('_'),
                            VMAT_EXTENSION
                        ));

                        if face != "bk" {
                            valid = false;
                        }
                    }
                }
            }
        }

        if !valid {
            self.log_info(
                format!("Skipping {}: no conversion for this material", vmt_path.display())
                    .as_str(),
            );
            summary.skipped += 1;
            return;
        }

        if vmat_path.exists() && !self.options.overwrite_vmat {
            summary.skipped += 1;
            return;
        }

        convert_specials(&mut material.params, vmt_path, root, shader);

        let conversion = MaterialConversion {
            options: &self.options,
            root,
            vmt_path,
            file_name: &file_name,
            shader,
            params: &material.params,
        }
        .convert();

        let document = build_vmat_document(shader, &file_name, &conversion);

        if let Err(err) = fs::write(&vmat_path, document) {
            summary.failures.push(Failure {
                path: vmt_path.to_path_buf(),
                reason: format!("cannot write {}: {}", vmat_path.display(), err),
            });
            return;
        }

        summary.failures.extend(conversion.failures);
        summary.converted.push(vmat_path);
    }
}

fn collect_vmt_files(root: &Path) -> Vec<PathBuf> {
    let materials_dir = root.join(MATERIALS_DIR);
    let scan_root = if materials_dir.exists() {
        materials_dir
    } else {
        root.to_path_buf()
    };

    WalkDir::new(scan_root)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && SKIP_FOLDERS.contains(&entry.file_name().to_str().unwrap_or("")))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == VMT_EXTENSION)
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Walks up from a single material file to the folder holding materials/.
fn content_root_for(file: &Path) -> PathBuf {
    let mut current = file.parent();

    while let Some(dir) = current {
        if dir.file_name().is_some_and(|name| name == MATERIALS_DIR) {
            return dir.parent().unwrap_or(dir).to_path_buf();
        }

        current = dir.parent();
    }

    file.parent().unwrap_or(Path::new(".")).to_path_buf()
}

/// Parameter fixups that need more context than the rule table has.
fn convert_specials(params: &mut ParamMap, vmt_path: &Path, root: &Path, shader: Shader) {
    let file_name = fix_backslash(&vmt_path.display().to_string());

    // weapon view models keep their AO map under customization/. move a copy
    // next to the material and register it like the material declared it.
    if let Some((prefix, rest)) = file_name.split_once(WEAPON_VMODELS_MARKER) {
        let weapon_dir = Path::new(rest)
            .parent()
            .map(|parent| fix_backslash(&parent.display().to_string()))
            .unwrap_or_default();

        if !weapon_dir.is_empty() && !weapon_dir.contains('/') {
            let short_name = weapon_dir.rsplit('_').next().unwrap_or(&weapon_dir);
            let matches_weapon = file_name.ends_with(&format!("{}.{}", weapon_dir, VMT_EXTENSION))
                || file_name.ends_with(&format!("{}.{}", short_name, VMT_EXTENSION));

            if matches_weapon {
                let ao_src = PathBuf::from(format!(
                    "{}/{}/{}/{}_ao{}",
                    prefix, WEAPON_CUSTOMIZATION_DIR, weapon_dir, weapon_dir, TEXTURE_FILEEXT
                ));

                if ao_src.exists() {
                    if let Some(parent) = vmt_path.parent() {
                        let ao_dst = parent.join(format!("{}{}", weapon_dir, TEXTURE_FILEEXT));

                        if !ao_dst.exists() {
                            let _ = fs::copy(&ao_src, &ao_dst);
                        }

                        let local = format_vmat_dir(root, &ao_dst);
                        let value = local
                            .strip_prefix("materials/")
                            .unwrap_or(&local)
                            .to_string();

                        params.insert("$aotexture".to_string(), value);
                    }
                }
            }
        }
    }

    if shader != Shader::Sky {
        // phong wants a reflectance mask. when no parameter names one, the
        // normal map alpha is the Source 1 default.
        if params.get("$phong").map(|v| clean_value(v)) == Some("1")
            && rules::mask_keys_producing("$phong")
                .iter()
                .all(|key| !params.contains_key(*key))
        {
            params.insert("$normalmapalphaphongmask".to_string(), "1".to_string());
        }

        // a missing exponent still shades, the default roughness has to
        // match that look
        if !params.contains_key("$phongexponent") {
            params.insert("$phongexponent".to_string(), "100".to_string());
        }

        if shader == Shader::VrSimple2WayBlend && !params.contains_key("$phongexponent2") {
            params.insert("$phongexponent2".to_string(), "100".to_string());
        }
    }
}

/// `skybox/sky_day01bk` to `materials/skybox/sky_day01_cube.tga`. The face
/// tag comes off and the compiler finds the other five faces by the cube
/// name.
fn sky_texture_path(value: &str, default_suffix: &str) -> String {
    let ext = default_suffix
        .strip_prefix("_color")
        .unwrap_or(default_suffix);
    let base = if value.len() > 2 && value.is_char_boundary(value.len() - 2) {
        &value[..value.len() - 2]
    } else {
        value
    };

    format_vmt_texture_dir(&format!("{}_cube{}", base.trim_end_matches('_'), ext), "")
}

struct MaterialConversion<'a> {
    options: &'a Vmt2VmatOptions,
    root: &'a Path,
    vmt_path: &'a Path,
    /// Forward-slashed path of the material being converted.
    file_name: &'a str,
    shader: Shader,
    params: &'a ParamMap,
}

pub(crate) struct ConvertedMaterial {
    /// Lines between `shader` and `SystemAttributes` in emission order.
    pub body: String,
    /// Emitted once at the end of the document.
    pub surface_prop: Option<String>,
    pub failures: Vec<Failure>,
}

impl ConvertedMaterial {
    fn emit(&mut self, key: &str, value: &str, extra: &str) {
        if extra.is_empty() {
            self.body.push_str(&format!("\t{}\t\t\"{}\"\n", key, value));
        } else {
            self.body
                .push_str(&format!("\n\t{}\n\t{}\t\t\"{}\"\n", extra, key, value));
        }
    }

    /// Flags live on unquoted lines. A flag already in the body is replaced
    /// where it stands, so the last write wins without duplicate lines.
    fn emit_flag(&mut self, key: &str, value: &str) {
        let needle = format!("\t{} ", key);

        if let Some(at) = self.body.find(&needle) {
            let line_end = self.body[at..]
                .find('\n')
                .map(|end| at + end)
                .unwrap_or(self.body.len());

            self.body
                .replace_range(at..line_end, &format!("\t{} {}", key, value));
        } else {
            self.body.push_str(&format!("\t{} {}\n", key, value));
        }
    }
}

impl MaterialConversion<'_> {
    fn convert(self) -> ConvertedMaterial {
        let mut out = ConvertedMaterial {
            body: String::new(),
            surface_prop: None,
            failures: vec![],
        };

        for (key, raw_value) in self.params {
            let key = key.as_str();
            let value = clean_value(raw_value);

            // unmapped parameters drop silently, there are hundreds of them
            let Some(rule) = rules::lookup(key) else {
                continue;
            };

            match rule {
                Rule::Texture(entry) => self.convert_texture(key, value, entry, &mut out),
                Rule::TexTransform(entry) => self.convert_transform(value, entry, &mut out),
                Rule::Setting(entry) => self.convert_setting(key, value, entry, &mut out),
                Rule::Flag(entry) => {
                    let out_value = match entry.transform {
                        Some(ValueTransform::DetailBlendModeRemap) => {
                            remap_detail_blend_mode(value)
                        }
                        _ => entry.default,
                    };

                    out.emit_flag(entry.replacement, out_value);
                }
                Rule::Mask {
                    produces,
                    source,
                    channel,
                } => self.convert_mask(key, value, produces, source, channel, &mut out),
                Rule::SurfaceProp => {
                    out.surface_prop =
                        Some(map_surface_prop(value, self.file_name.contains("props")));
                }
                Rule::NoOp { silent } => {
                    if !*silent {
                        out.body.push_str(&format!("\t// no counterpart: {}\n", key));
                    }
                }
            }
        }

        out
    }

    fn relocator(&self) -> TextureRelocator {
        TextureRelocator {
            root: self.root,
            rename_textures: self.options.rename_textures,
            remove_vtf: self.options.remove_vtf,
            vmt_file_name: self.file_name,
        }
    }

    fn is_model_surface(&self) -> bool {
        self.file_name.contains("models/")
    }

    fn param_is(&self, key: &str, value: &str) -> bool {
        self.params.get(key).map(|v| clean_value(v)) == Some(value)
    }

    /// First key whose texture resolves to a file on disk, as a
    /// content-relative path. Tries the renamed path first since an earlier
    /// conversion may already have moved the file.
    fn get_texture(&self, keys: &[&str]) -> Option<String> {
        for key in keys {
            let Some(raw) = self.params.get(*key) else {
                continue;
            };
            let value = clean_value(raw);

            if value.is_empty() {
                continue;
            }

            if let Some(entry) = rules::texture_entry(key) {
                let renamed = self.relocator().compute_texture_path(value, entry.default);

                if format_full_dir(self.root, &renamed).exists() {
                    return Some(renamed);
                }
            }

            let plain = format_vmt_texture_dir(value, TEXTURE_FILEEXT);

            if format_full_dir(self.root, &plain).exists() {
                return Some(plain);
            }
        }

        None
    }

    /// Derives a grayscale mask from a channel of `source_local` and returns
    /// the value to emit, either a texture path or a flat vector.
    fn make_mask(
        &self,
        source_local: &str,
        spec: &str,
        suffix: &str,
        out: &mut ConvertedMaterial,
    ) -> String {
        let placeholder = format!("{}{}", DEFAULT_TEXTURE_PREFIX, suffix);

        let Some(spec) = ChannelSpec::parse(spec) else {
            return placeholder;
        };

        let invert = spec.invert.applies(self.is_model_surface());
        let full = format_full_dir(self.root, source_local);

        match img_stuffs::create_mask_from_channel(&full, spec.channel, invert, suffix) {
            Ok(MaskOutput::Path(path)) => format_vmat_dir(self.root, &path),
            Ok(MaskOutput::Uniform(value)) => {
                format!("[{:.6} {:.6} {:.6} 1.000000]", value, value, value)
            }
            Err(err) => {
                out.failures.push(Failure {
                    path: self.vmt_path.to_path_buf(),
                    reason: format!(
                        "cannot derive {} channel mask from {}: {}",
                        spec.channel.letter(),
                        source_local,
                        err
                    ),
                });

                placeholder
            }
        }
    }

    fn convert_texture(&self, key: &str, value: &str, entry: &Entry, out: &mut ConvertedMaterial) {
        let mut out_key = entry.replacement.to_string();
        let mut out_value = format!("{}{}", DEFAULT_TEXTURE_PREFIX, entry.default);
        let mut extra = entry.extra.to_string();

        match key {
            "$basetexture" | "$painttexture" | "$hdrbasetexture" | "$hdrcompressedtexture" => {
                if self.params.contains_key("$newlayerblending")
                    || self.params.contains_key("$basetexture2")
                {
                    out_key.push('A');
                }

                if self.shader == Shader::Sky {
                    out_key = "SkyTexture".to_string();
                    out_value = sky_texture_path(value, entry.default);
                } else {
                    out_value = self.relocator().new_texture_path(value, entry.default);
                }
            }
            "$basetexture3" | "$basetexture4" => {
                out.failures.push(Failure {
                    path: self.vmt_path.to_path_buf(),
                    reason: format!("{}: no shader supports a 3rd or 4th blend layer", key),
                });
            }
            "$bumpmap" | "$bumpmap2" | "$normalmap" | "$normalmap2" => {
                if key != "$bumpmap2"
                    && (self.shader == Shader::VrSimple2WayBlend
                        || self.params.contains_key("$basetexture2"))
                {
                    out_key.push('A');
                }

                // self-shadowing bumps are a different encoding, leave the
                // line in but flagged for hand checking
                if self.param_is("$ssbump", "1") {
                    out_key = format!("// $ssbump\n\t{}", out_key);
                }

                out_value = self.relocator().new_texture_path(value, entry.default);

                if !out_value.contains("default/default") {
                    let _ = img_stuffs::write_normal_flip_settings(&format_full_dir(
                        self.root, &out_value,
                    ));
                }
            }
            "$blendmodulatetexture" => {
                if let Some(source) = self.get_texture(&[key]) {
                    out_value = self.make_mask(&source, "G", entry.default, out);
                }
            }
            "$envmap" => {
                if value == "env_cubemap" {
                    if let Some(tint) = self.params.get("$envmaptint") {
                        out_value = fix_vector(clean_value(tint), true, 0)
                            .unwrap_or_else(|| "[1.000000 1.000000 1.000000 1.000000]".to_string());
                    } else {
                        // an untinted ambient cubemap is pure feature flags
                        out.body.push_str(&format!("\t{}\n", entry.extra));
                        return;
                    }
                } else {
                    extra = "F_SPECULAR 1".to_string();
                }
            }
            // reflectance comes from the alpha mask parameters, a bare
            // $phong carries no value of its own
            "$phong" => return,
            "$translucent" | "$alphatest" => {
                if value == "0" {
                    return;
                }

                // anything but a plain opacity number keeps the placeholder,
                // there is no texture to pull an alpha from
                let derives_mask = key == "$alphatest" || value.parse::<f64>().is_ok();

                if derives_mask {
                    if let Some(source) = self.get_texture(&["$basetexture"]) {
                        out_value = self.make_mask(&source, "A", entry.default, out);
                    }
                }
            }
            "$tintmasktexture" | "$aotexture" => {
                if let Some(source) = self.get_texture(&[key]) {
                    out_value = self.make_mask(&source, "G", entry.default, out);
                } else {
                    out_value = self.relocator().new_texture_path(value, entry.default);
                }
            }
            _ => {
                if value != "env_cubemap" && self.shader != Shader::Sky {
                    out_value = self.relocator().new_texture_path(value, entry.default);
                }
            }
        }

        out.emit(&out_key, &out_value, &extra);
    }

    fn convert_transform(&self, value: &str, entry: &Entry, out: &mut ConvertedMaterial) {
        if entry.replacement.is_empty() || self.shader == Shader::Sky {
            return;
        }

        let Some(transform) = TextureTransform::parse(value) else {
            return;
        };

        if !transform.is_identity_scale() {
            out.body.push_str(&format!(
                "\t{}CoordScale\t\t\"{}\"\n",
                entry.replacement,
                transform.scale_str()
            ));
        }

        if !transform.is_zero_translate() {
            out.body.push_str(&format!(
                "\t{}CoordOffset\t\t\"{}\"\n",
                entry.replacement,
                transform.translate_str()
            ));
        }

        // TODO: wire rotation into g_flTexCoordRotation once a material that
        // actually uses it shows up
    }

    fn convert_setting(&self, key: &str, value: &str, entry: &Entry, out: &mut ConvertedMaterial) {
        let mut out_key = entry.replacement.to_string();
        let mut out_value = entry.default.to_string();

        match entry.transform {
            Some(ValueTransform::FloatFormat) => {
                if let Some(formatted) = format_float(value) {
                    out_value = formatted;
                }
            }
            Some(ValueTransform::InvertBool) => {
                if let Some(inverted) = invert_bool(value) {
                    out_value = inverted;
                }
            }
            Some(ValueTransform::InvertBoolFloat) => {
                if let Some(inverted) = invert_bool_float(value) {
                    out_value = inverted;
                }
            }
            Some(ValueTransform::ColorVector) => {
                if !value.is_empty() {
                    if let Some(vector) = fix_vector(value, true, 0) {
                        out_value = vector;
                    }
                }
            }
            Some(ValueTransform::DetailScale) => {
                let replicate = if value.contains('[') { 0 } else { 1 };

                if let Some(vector) = fix_vector(value, false, replicate) {
                    out_value = vector;
                }
            }
            Some(ValueTransform::DetailBlendModeRemap) | None => {}
        }

        if key == "$phongexponent" && self.shader == Shader::VrSimple2WayBlend {
            out_key.push('A');
        }

        out.emit(&out_key, &out_value, entry.extra);
    }

    fn convert_mask(
        &self,
        key: &str,
        value: &str,
        produces: &str,
        source: &MaskSource,
        channel: &str,
        out: &mut ConvertedMaterial,
    ) {
        if value == "0" {
            return;
        }

        // an explicit texture for the same slot always beats a derived mask
        if self.params.contains_key(produces) {
            println!(
                "~ WARNING: {} conflicts with an explicit {} in {}. Skipping the derived mask.",
                key,
                produces,
                self.file_name
            );
            return;
        }

        let Some(entry) = rules::texture_entry(produces) else {
            return;
        };

        let resolved = match source {
            MaskSource::Key(source_key) => self.get_texture(&[*source_key]),
            MaskSource::NormalMaps => self.get_texture(NORMAL_MAP_KEYS),
        };

        let out_value = match resolved {
            Some(source_local) => self.make_mask(&source_local, channel, entry.default, out),
            None => {
                out.failures.push(Failure {
                    path: self.vmt_path.to_path_buf(),
                    reason: format!("no source texture on disk to derive {} from {}", produces, key),
                });

                format!("{}{}", DEFAULT_TEXTURE_PREFIX, entry.default)
            }
        };

        out.emit(entry.replacement, &out_value, entry.extra);
    }
}

pub(crate) fn build_vmat_document(
    shader: Shader,
    source_name: &str,
    conversion: &ConvertedMaterial,
) -> String {
    let mut document = format!(
        "// THIS FILE IS AUTO-GENERATED\n// Converted from: {}\n\nLayer0\n{{\n\tshader \"{}.vfx\"\n\n",
        source_name,
        shader.name()
    );

    document.push_str(&conversion.body);

    if let Some(surface_prop) = &conversion.surface_prop {
        document.push_str(&format!(
            "\n\tSystemAttributes\n\t{{\n\t\tPhysicsSurfaceProperties\t\"{}\"\n\t}}\n",
            surface_prop
        ));
    }

    document.push_str("}\n");

    document
}
