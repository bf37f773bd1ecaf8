//! Stubs out `.vmdl` descriptions for legacy `.mdl` files.
//!
//! The model compiler does the heavy lifting from the original file, the
//! stub only has to point at it. Materials on the model are found through
//! the `.vmat` files converted separately.

use std::{
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::err;
use crate::utils::constants::MODELS_DIR;
use crate::utils::misc::{fix_backslash, format_vmat_dir};

const VMDL_EXTENSION: &str = "vmdl";
const MDL_EXTENSION: &str = "mdl";

/// KV3 text document referencing the legacy model.
pub fn vmdl_content(mdl_local: &str) -> String {
    format!(
        "\
<!-- kv3 encoding:text:version{{e21c7f3c-8a33-41c5-9977-a76d3a32aa0d}} format:generic:version{{7412167c-06e9-4698-aff2-e63eb59037e7}} -->
{{
\tm_sMDLFilename = \"{}\"
}}
",
        mdl_local
    )
}

pub struct Mdl2Vmdl {
    path: PathBuf,
    overwrite: bool,
}

impl Mdl2Vmdl {
    /// `path` is a content root holding a models/ folder.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            overwrite: false,
        }
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    fn log_info(&self, what: &str) {
        println!("{}", what);
    }

    pub fn work(&mut self) -> eyre::Result<Vec<PathBuf>> {
        if !self.path.is_dir() {
            return err!("{} is not a folder", self.path.display());
        }

        let models_dir = self.path.join(MODELS_DIR);
        let scan_root = if models_dir.exists() {
            models_dir
        } else {
            self.path.clone()
        };

        let mdl_files: Vec<PathBuf> = WalkDir::new(scan_root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext == MDL_EXTENSION)
            })
            .map(|entry| entry.into_path())
            .collect();

        self.log_info(format!("Found ({}) model(s)", mdl_files.len()).as_str());

        let mut created = vec![];

        for mdl_path in mdl_files {
            let vmdl_path = mdl_path.with_extension(VMDL_EXTENSION);

            if vmdl_path.exists() && !self.overwrite {
                continue;
            }

            let mdl_local = fix_backslash(&format_vmat_dir(&self.path, &mdl_path));

            fs::write(&vmdl_path, vmdl_content(&mdl_local))?;

            self.log_info(format!("Created {}", vmdl_path.display()).as_str());
            created.push(vmdl_path);
        }

        Ok(created)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stub_points_at_the_legacy_model() {
        let content = vmdl_content("models/props/barrel.mdl");

        assert!(content.starts_with("<!-- kv3 "));
        assert!(content.contains("m_sMDLFilename = \"models/props/barrel.mdl\""));
    }

    #[test]
    fn stubs_every_model_under_models() {
        let root = std::env::temp_dir().join(format!("mdl2vmdl_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("models/props")).unwrap();
        fs::write(root.join("models/props/barrel.mdl"), b"IDST").unwrap();

        let created = Mdl2Vmdl::new(&root).work().unwrap();

        assert_eq!(created.len(), 1);

        let content = fs::read_to_string(root.join("models/props/barrel.vmdl")).unwrap();

        assert!(content.contains("m_sMDLFilename = \"models/props/barrel.mdl\""));

        // a second run leaves the existing stub alone
        let created = Mdl2Vmdl::new(&root).work().unwrap();

        assert!(created.is_empty());

        let _ = fs::remove_dir_all(&root);
    }
}
