//! Render Command Model
//!
//! A [`RenderCommand`] pairs a [`CommandType`] discriminant with a strongly
//! typed payload. Game objects produce commands while collecting, layers
//! consume the subset they support, and [`execute_command`] maps each one onto
//! a [`GraphicsContext`].
//!
//! # Command Types
//!
//! - `Clear`, `SetDepthState`, `SetCullMode`, `Scissor`: fixed-function state
//! - `DrawArray`, `DrawTexture`, `DrawText`: draw calls
//! - `SetUniforms`, `UseShader`: program state
//! - `Window`: host window requests (title, vsync, ...)
//! - `GpuCommand`: an arbitrary callback run against the context
//!
//! ## Example
//!
//! ```ignore
//! let cmd = RenderCommand::new(ClearPayload::color([0.0, 0.0, 0.0, 1.0]));
//! assert_eq!(cmd.command_type(), CommandType::Clear);
//!
//! let clear: &ClearPayload = cmd.payload()?;
//! assert!(cmd.payload::<DrawTextPayload>().is_err());
//! ```
//!
//! [`GraphicsContext`]: crate::context::GraphicsContext

use core::fmt;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::{
    CompareFunction, CullMode, FrontFace, GraphicsContext, PixelRect, PrimitiveTopology,
    UniformValue,
};
use crate::handle::{ShaderHandle, TextureHandle, VertexArrayHandle};

/// Discriminant of a render command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandType {
    Clear = 0,
    DrawArray = 1,
    DrawTexture = 2,
    DrawText = 3,
    SetDepthState = 4,
    SetCullMode = 5,
    SetUniforms = 6,
    Window = 7,
    Scissor = 8,
    UseShader = 9,
    GpuCommand = 10,
}

impl CommandType {
    /// Every command type, in discriminant order
    pub const ALL: [CommandType; 11] = [
        CommandType::Clear,
        CommandType::DrawArray,
        CommandType::DrawTexture,
        CommandType::DrawText,
        CommandType::SetDepthState,
        CommandType::SetCullMode,
        CommandType::SetUniforms,
        CommandType::Window,
        CommandType::Scissor,
        CommandType::UseShader,
        CommandType::GpuCommand,
    ];

    /// Name used in logs and diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            CommandType::Clear => "Clear",
            CommandType::DrawArray => "DrawArray",
            CommandType::DrawTexture => "DrawTexture",
            CommandType::DrawText => "DrawText",
            CommandType::SetDepthState => "SetDepthState",
            CommandType::SetCullMode => "SetCullMode",
            CommandType::SetUniforms => "SetUniforms",
            CommandType::Window => "Window",
            CommandType::Scissor => "Scissor",
            CommandType::UseShader => "UseShader",
            CommandType::GpuCommand => "GpuCommand",
        }
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by the command model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The payload does not belong to the command type
    #[error("{command} command cannot carry a {found} payload (expected {expected})")]
    PayloadMismatch {
        command: CommandType,
        expected: &'static str,
        found: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Clear the bound target. `None` leaves that aspect untouched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearPayload {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
    pub stencil: Option<u32>,
}

impl ClearPayload {
    /// Clear color and depth
    pub fn color(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
            stencil: None,
        }
    }

    /// Clear depth only
    pub fn depth_only() -> Self {
        Self {
            color: None,
            depth: Some(1.0),
            stencil: None,
        }
    }
}

impl Default for ClearPayload {
    fn default() -> Self {
        Self::color([0.0, 0.0, 0.0, 1.0])
    }
}

/// Non-indexed draw from a vertex array
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawArrayPayload {
    pub vertex_array: VertexArrayHandle,
    pub topology: PrimitiveTopology,
    pub first: u32,
    pub count: u32,
    pub instances: u32,
}

impl DrawArrayPayload {
    pub fn triangles(vertex_array: VertexArrayHandle, count: u32) -> Self {
        Self {
            vertex_array,
            topology: PrimitiveTopology::Triangles,
            first: 0,
            count,
            instances: 1,
        }
    }
}

/// Screen-space textured quad (sprites)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawTexturePayload {
    pub texture: TextureHandle,
    pub position: Vec2,
    pub size: Vec2,
    /// Rotation in radians around the quad center
    pub rotation: f32,
    pub tint: [f32; 4],
    /// Normalized source rectangle `[u0, v0, u1, v1]`, whole texture if `None`
    pub source: Option<[f32; 4]>,
    /// Sort key within the layer, lower draws first
    pub depth: f32,
}

impl DrawTexturePayload {
    pub fn new(texture: TextureHandle, position: Vec2, size: Vec2) -> Self {
        Self {
            texture,
            position,
            size,
            rotation: 0.0,
            tint: [1.0; 4],
            source: None,
            depth: 0.0,
        }
    }
}

/// Text drawn with a named font
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawTextPayload {
    pub font: String,
    pub text: String,
    pub position: Vec2,
    pub scale: f32,
    pub color: [f32; 4],
}

impl DrawTextPayload {
    pub fn new(font: impl Into<String>, text: impl Into<String>, position: Vec2) -> Self {
        Self {
            font: font.into(),
            text: text.into(),
            position,
            scale: 1.0,
            color: [1.0; 4],
        }
    }
}

/// Depth test / write state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthStatePayload {
    pub test: bool,
    pub write: bool,
    pub compare: CompareFunction,
}

impl Default for DepthStatePayload {
    fn default() -> Self {
        Self {
            test: true,
            write: true,
            compare: CompareFunction::Less,
        }
    }
}

/// Face culling state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CullModePayload {
    pub mode: CullMode,
    pub front_face: FrontFace,
}

impl Default for CullModePayload {
    fn default() -> Self {
        Self {
            mode: CullMode::Back,
            front_face: FrontFace::Ccw,
        }
    }
}

/// A batch of uniform uploads, optionally binding `program` first
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct UniformsPayload {
    pub program: Option<ShaderHandle>,
    pub values: Vec<(String, UniformValue)>,
}

impl UniformsPayload {
    pub fn with(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

/// Host window request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WindowCommand {
    SetTitle(String),
    SetVSync(bool),
    SetFullscreen(bool),
    SetSize { width: u32, height: u32 },
    Close,
}

/// Window command payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowPayload {
    pub command: WindowCommand,
}

impl WindowPayload {
    pub fn set_title(title: impl Into<String>) -> Self {
        Self {
            command: WindowCommand::SetTitle(title.into()),
        }
    }
}

/// Scissor rectangle, `None` disables the scissor test
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ScissorPayload {
    pub rect: Option<PixelRect>,
}

/// Bind a shader program
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UseShaderPayload {
    pub program: ShaderHandle,
}

/// Callback run directly against the graphics context
pub type GpuCallback = Arc<dyn Fn(&mut dyn GraphicsContext) + Send + Sync>;

/// Escape hatch for work that has no dedicated command
#[derive(Clone)]
pub struct GpuCommandPayload {
    pub label: String,
    pub callback: GpuCallback,
}

impl GpuCommandPayload {
    pub fn new<F>(label: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut dyn GraphicsContext) + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for GpuCommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuCommandPayload")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PartialEq for GpuCommandPayload {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && Arc::ptr_eq(&self.callback, &other.callback)
    }
}

// ---------------------------------------------------------------------------
// Tagged union
// ---------------------------------------------------------------------------

/// Typed access to one [`RenderPayload`] variant
pub trait Payload: Sized + 'static {
    /// Command type this payload belongs to
    const COMMAND_TYPE: CommandType;
    /// Type name used in mismatch errors
    const NAME: &'static str;

    fn from_payload(payload: &RenderPayload) -> Option<&Self>;
    fn into_payload(self) -> RenderPayload;
}

macro_rules! render_payloads {
    ($($variant:ident($ty:ident)),* $(,)?) => {
        /// Payload of a render command, one variant per [`CommandType`]
        #[derive(Clone, Debug, PartialEq)]
        pub enum RenderPayload {
            $($variant($ty),)*
        }

        impl RenderPayload {
            /// Command type implied by the variant
            pub fn command_type(&self) -> CommandType {
                match self {
                    $(RenderPayload::$variant(_) => CommandType::$variant,)*
                }
            }

            /// Name of the payload type
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(RenderPayload::$variant(_) => stringify!($ty),)*
                }
            }
        }

        $(
            impl Payload for $ty {
                const COMMAND_TYPE: CommandType = CommandType::$variant;
                const NAME: &'static str = stringify!($ty);

                fn from_payload(payload: &RenderPayload) -> Option<&Self> {
                    match payload {
                        RenderPayload::$variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn into_payload(self) -> RenderPayload {
                    RenderPayload::$variant(self)
                }
            }

            impl From<$ty> for RenderPayload {
                fn from(payload: $ty) -> Self {
                    RenderPayload::$variant(payload)
                }
            }
        )*

        /// Name of the payload type a command type expects
        fn expected_payload(command: CommandType) -> &'static str {
            match command {
                $(CommandType::$variant => stringify!($ty),)*
            }
        }
    };
}

render_payloads! {
    Clear(ClearPayload),
    DrawArray(DrawArrayPayload),
    DrawTexture(DrawTexturePayload),
    DrawText(DrawTextPayload),
    SetDepthState(DepthStatePayload),
    SetCullMode(CullModePayload),
    SetUniforms(UniformsPayload),
    Window(WindowPayload),
    Scissor(ScissorPayload),
    UseShader(UseShaderPayload),
    GpuCommand(GpuCommandPayload),
}

/// One GPU-facing action, immutable once built
#[derive(Clone, Debug, PartialEq)]
pub struct RenderCommand {
    command_type: CommandType,
    payload: RenderPayload,
}

impl RenderCommand {
    /// Build a command whose type is derived from the payload
    pub fn new<P: Payload>(payload: P) -> Self {
        Self {
            command_type: P::COMMAND_TYPE,
            payload: payload.into_payload(),
        }
    }

    /// Build a command, checking that the payload belongs to `command_type`
    pub fn create(
        command_type: CommandType,
        payload: impl Into<RenderPayload>,
    ) -> Result<Self, CommandError> {
        let payload = payload.into();
        if payload.command_type() != command_type {
            return Err(CommandError::PayloadMismatch {
                command: command_type,
                expected: expected_payload(command_type),
                found: payload.type_name(),
            });
        }
        Ok(Self {
            command_type,
            payload,
        })
    }

    #[inline]
    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// Read the payload as `P`, failing if another payload is stored
    pub fn payload<P: Payload>(&self) -> Result<&P, CommandError> {
        P::from_payload(&self.payload).ok_or(CommandError::PayloadMismatch {
            command: self.command_type,
            expected: P::NAME,
            found: self.payload.type_name(),
        })
    }

    /// The untyped payload, for exhaustive matching
    #[inline]
    pub fn raw_payload(&self) -> &RenderPayload {
        &self.payload
    }
}

// ---------------------------------------------------------------------------
// Sets and lists
// ---------------------------------------------------------------------------

/// Small bitset of command types
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CommandTypeSet(u16);

impl CommandTypeSet {
    pub const EMPTY: Self = Self(0);

    pub const fn all() -> Self {
        Self((1 << CommandType::ALL.len()) - 1)
    }

    pub fn of(types: &[CommandType]) -> Self {
        types.iter().copied().collect()
    }

    pub const fn with(self, ty: CommandType) -> Self {
        Self(self.0 | ty.bit())
    }

    pub fn insert(&mut self, ty: CommandType) {
        self.0 |= ty.bit();
    }

    pub fn remove(&mut self, ty: CommandType) {
        self.0 &= !ty.bit();
    }

    #[inline]
    pub const fn contains(self, ty: CommandType) -> bool {
        self.0 & ty.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = CommandType> {
        CommandType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }
}

impl FromIterator<CommandType> for CommandTypeSet {
    fn from_iter<I: IntoIterator<Item = CommandType>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for ty in iter {
            set.insert(ty);
        }
        set
    }
}

impl fmt::Debug for CommandTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Ordered command buffer. Insertion order is render order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Push a command built from a payload
    pub fn push_payload<P: Payload>(&mut self, payload: P) {
        self.commands.push(RenderCommand::new(payload));
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = RenderCommand>) {
        self.commands.extend(other);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenderCommand> {
        self.commands.iter()
    }

    pub fn as_slice(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of commands of one type
    pub fn count_of(&self, ty: CommandType) -> usize {
        self.commands
            .iter()
            .filter(|cmd| cmd.command_type() == ty)
            .count()
    }

    /// Split into `(supported, rest)`, both keeping their relative order
    pub fn partition_supported(self, supported: CommandTypeSet) -> (CommandList, CommandList) {
        let (claimed, rest): (Vec<_>, Vec<_>) = self
            .commands
            .into_iter()
            .partition(|cmd| supported.contains(cmd.command_type()));
        (
            CommandList { commands: claimed },
            CommandList { commands: rest },
        )
    }

    pub fn into_vec(self) -> Vec<RenderCommand> {
        self.commands
    }
}

impl From<Vec<RenderCommand>> for CommandList {
    fn from(commands: Vec<RenderCommand>) -> Self {
        Self { commands }
    }
}

impl FromIterator<RenderCommand> for CommandList {
    fn from_iter<I: IntoIterator<Item = RenderCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CommandList {
    type Item = RenderCommand;
    type IntoIter = std::vec::IntoIter<RenderCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a RenderCommand;
    type IntoIter = std::slice::Iter<'a, RenderCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run one command against the graphics context
pub fn execute_command(gfx: &mut dyn GraphicsContext, command: &RenderCommand) {
    match command.raw_payload() {
        RenderPayload::Clear(clear) => gfx.clear(clear),
        RenderPayload::DrawArray(draw) => gfx.draw_arrays(draw),
        RenderPayload::DrawTexture(draw) => gfx.draw_texture(draw),
        RenderPayload::DrawText(draw) => gfx.draw_text(draw),
        RenderPayload::SetDepthState(state) => gfx.set_depth_state(state),
        RenderPayload::SetCullMode(cull) => gfx.set_cull_mode(cull.mode, cull.front_face),
        RenderPayload::SetUniforms(uniforms) => {
            if let Some(program) = uniforms.program {
                gfx.use_program(program);
            }
            for (name, value) in &uniforms.values {
                gfx.set_uniform(name, *value);
            }
        }
        RenderPayload::Window(window) => gfx.window(&window.command),
        RenderPayload::Scissor(scissor) => gfx.set_scissor(scissor.rect),
        RenderPayload::UseShader(shader) => gfx.use_program(shader.program),
        RenderPayload::GpuCommand(gpu) => (gpu.callback)(gfx),
    }
}
