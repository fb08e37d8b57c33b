/// Surface parameters used by the lit object shader.
#[derive(Debug, Clone)]
pub struct MaterialAsset {
    pub name: Option<String>,
    pub base_color: [f32; 4],
    /// Index into the document texture table.
    pub base_color_texture: Option<usize>,
}

impl Default for MaterialAsset {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0; 4],
            base_color_texture: None,
        }
    }
}
