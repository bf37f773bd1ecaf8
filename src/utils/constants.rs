/// File format the converted textures are stored in. Lowercase.
pub const TEXTURE_FILEEXT: &str = ".tga";

/// Placeholder asset emitted when a texture cannot be resolved. Gets the
/// map-specific tag appended, eg `materials/default/default_color.tga`.
pub const DEFAULT_TEXTURE_PREFIX: &str = "materials/default/default";

pub const VMT_EXTENSION: &str = "vmt";
pub const VMAT_EXTENSION: &str = "vmat";

pub const MATERIALS_DIR: &str = "materials";
pub const MODELS_DIR: &str = "models";

/// Folders under materials/ that only hold editor and debug content.
pub const SKIP_FOLDERS: &[&str] = &["dev", "debug", "tools", "vgui", "console", "correction"];

pub const SKYBOX_DIR_MARKER: &str = "/skybox/";
pub const SKYBOX_FACES: &[&str] = &["up", "dn", "lf", "rt", "bk", "ft"];

pub const WEAPON_VMODELS_MARKER: &str = "/weapons/v_models/";
pub const WEAPON_CUSTOMIZATION_DIR: &str = "weapons/customization";

/// CS:GO weapon skins patch off this master material and carry no
/// convertible content of their own.
pub const PAINTS_MASTER_INCLUDE: &str = "materials/models/weapons/customization/paints/master.vmt";
