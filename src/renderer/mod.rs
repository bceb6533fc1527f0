//! Rendering module
//!
//! `scene` turns the field into drawable primitives (pure, testable).
//! `sdf_pipeline` paints a scene with WebGPU using signed distance fields
//! in the fragment shader.

pub mod scene;
pub mod sdf_pipeline;

pub use scene::{
    CursorGlow, FocalDisc, Label, Line, Rgba, Scene, SceneStyle, StarSprite, build_scene,
    build_warp_scene,
};
pub use sdf_pipeline::SdfRenderState;
