#[derive(Debug, Clone, Default)]
pub struct SkinAsset {
    pub name: Option<String>,
    /// Node indices, in joint order.
    pub joints: Vec<usize>,
    /// Accessor holding one mat4 per joint.
    pub inverse_bind_matrices: Option<usize>,
    pub skeleton: Option<usize>,
}
