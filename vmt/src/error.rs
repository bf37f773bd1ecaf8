#[derive(Debug, thiserror::Error)]
pub enum VmtError {
    #[error("Error opening material: {source}")]
    IOError {
        #[source]
        source: std::io::Error,
    },
    #[error("Material has no type declaration")]
    NoMaterialType,
}
