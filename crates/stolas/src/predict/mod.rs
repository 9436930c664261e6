//! Dual-output Lorenzo predictor-quantizer.
//!
//! The forward pass prequantizes each sample to `round(s / (2 * eb))` and
//! predicts it from the inclusion-exclusion sum of its already-written
//! lower-index neighbors. A residual inside `(-radius, radius)` becomes a
//! quant code offset by `radius`; anything else becomes quant code 0 with
//! the residual carried on a parallel real-valued outlier plane.
//!
//! The array is tiled and every tile predicts independently: out-of-tile
//! neighbors contribute zero, trading a little compression ratio at tile
//! seams for fully parallel tiles. The inverse pass replays the same
//! recurrence as an in-tile prefix sum and rescales by `2 * eb`.

mod lorenzo;
mod reconstruct;

pub use lorenzo::quantize;
pub use reconstruct::reconstruct;

/// Tile width for rank-1 arrays.
pub const BLOCK_1D: usize = 256;
/// Tile side for rank-2 arrays.
pub const BLOCK_2D: usize = 16;
/// Tile extents for rank-3 arrays.
pub const BLOCK_3D_X: usize = 32;
pub const BLOCK_3D_Y: usize = 8;
pub const BLOCK_3D_Z: usize = 8;
