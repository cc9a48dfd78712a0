//! Version-independent display model types.
//!
//! These types are what gameplay code hands to the facade. Adapters translate
//! them into whatever their host version expects on the wire.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers and Locations
// ============================================================================

/// Unique identifier for a spawned display model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub Uuid);

impl ModelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a viewer (a connected player on the host)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewerId(pub Uuid);

impl ViewerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in a named world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns the same location offset by a translation vector.
    pub fn offset(&self, by: Vector3) -> Self {
        Self {
            world: self.world.clone(),
            x: self.x + by.x as f64,
            y: self.y + by.y as f64,
            z: self.z + by.z as f64,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}

// ============================================================================
// Math
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Rotation quaternion, `(0, 0, 0, 1)` is no rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Rotation of `angle` radians around `axis`. A zero axis yields identity.
    pub fn from_axis_angle(angle: f32, axis: Vector3) -> Self {
        let length = axis.length();
        if length == 0.0 {
            return Self::IDENTITY;
        }
        let half = angle * 0.5;
        let s = half.sin() / length;
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    /// Hamilton product `self * other`
    pub fn mul(&self, other: &Quaternion) -> Self {
        Self {
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Affine display transformation: translation, left rotation, scale, right rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vector3,
    pub left_rotation: Quaternion,
    pub scale: Vector3,
    pub right_rotation: Quaternion,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::ZERO,
            left_rotation: Quaternion::IDENTITY,
            scale: Vector3::ONE,
            right_rotation: Quaternion::IDENTITY,
        }
    }

    pub fn translate(mut self, x: f32, y: f32, z: f32) -> Self {
        self.translation.x += x;
        self.translation.y += y;
        self.translation.z += z;
        self
    }

    /// Multiplies the scale uniformly.
    pub fn scaled(mut self, scalar: f32) -> Self {
        self.scale.x *= scalar;
        self.scale.y *= scalar;
        self.scale.z *= scalar;
        self
    }

    pub fn scale_by(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale.x *= x;
        self.scale.y *= y;
        self.scale.z *= z;
        self
    }

    pub fn rotate_left(mut self, angle: f32, axis: Vector3) -> Self {
        self.left_rotation = self.left_rotation.mul(&Quaternion::from_axis_angle(angle, axis));
        self
    }

    pub fn rotate_right(mut self, angle: f32, axis: Vector3) -> Self {
        self.right_rotation = self.right_rotation.mul(&Quaternion::from_axis_angle(angle, axis));
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Render Properties
// ============================================================================

/// How the model turns to face viewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Billboard {
    #[default]
    Fixed,
    Vertical,
    Horizontal,
    Center,
}

impl Billboard {
    /// Wire ordinal shared by every supported host version
    pub fn id(&self) -> u8 {
        match self {
            Billboard::Fixed => 0,
            Billboard::Vertical => 1,
            Billboard::Horizontal => 2,
            Billboard::Center => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ShadowFields")]
pub struct Shadow {
    radius: f32,
    strength: f32,
}

#[derive(Deserialize)]
struct ShadowFields {
    radius: f32,
    strength: f32,
}

impl TryFrom<ShadowFields> for Shadow {
    type Error = ModelError;

    fn try_from(fields: ShadowFields) -> Result<Self, Self::Error> {
        Shadow::new(fields.radius, fields.strength)
    }
}

impl Shadow {
    pub const MAX_RADIUS: f32 = 64.0;

    pub fn new(radius: f32, strength: f32) -> Result<Self, ModelError> {
        // NaN fails the range check
        if !(0.0..=Self::MAX_RADIUS).contains(&radius) {
            return Err(ModelError::ShadowRadius(radius));
        }
        Ok(Self { radius, strength })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }
}

/// Culling box; `0 x 0` disables culling
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Culling {
    pub width: f32,
    pub height: f32,
}

/// Light level override for block and sky light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BrightnessFields")]
pub struct Brightness {
    block_light: u8,
    sky_light: u8,
}

#[derive(Deserialize)]
struct BrightnessFields {
    block_light: i32,
    sky_light: i32,
}

impl TryFrom<BrightnessFields> for Brightness {
    type Error = ModelError;

    fn try_from(fields: BrightnessFields) -> Result<Self, Self::Error> {
        Brightness::new(fields.block_light, fields.sky_light)
    }
}

impl Brightness {
    pub const FULL_BRIGHT: Brightness = Brightness {
        block_light: 15,
        sky_light: 15,
    };
    pub const SHADOW: Brightness = Brightness {
        block_light: 0,
        sky_light: 0,
    };

    pub fn new(block_light: i32, sky_light: i32) -> Result<Self, ModelError> {
        Ok(Self {
            block_light: check_range("blockLight", block_light, 0, 15)? as u8,
            sky_light: check_range("skyLight", sky_light, 0, 15)? as u8,
        })
    }

    pub fn block_light(&self) -> u8 {
        self.block_light
    }

    pub fn sky_light(&self) -> u8 {
        self.sky_light
    }

    /// Packed form used in entity metadata: `block << 4 | sky << 20`
    pub fn packed(&self) -> i32 {
        (self.block_light as i32) << 4 | (self.sky_light as i32) << 20
    }
}

/// ARGB color with every channel clamped to `0..=255`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub fn new(alpha: i32, red: i32, green: i32, blue: i32) -> Self {
        Self {
            alpha: alpha.clamp(0, 255) as u8,
            red: red.clamp(0, 255) as u8,
            green: green.clamp(0, 255) as u8,
            blue: blue.clamp(0, 255) as u8,
        }
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn with_alpha(self, alpha: i32) -> Self {
        Self::new(alpha, self.red as i32, self.green as i32, self.blue as i32)
    }

    pub fn to_argb(&self) -> i32 {
        ((self.alpha as u32) << 24 | (self.red as u32) << 16 | (self.green as u32) << 8 | self.blue as u32)
            as i32
    }

    pub fn from_argb(argb: i32) -> Self {
        let argb = argb as u32;
        Self {
            alpha: (argb >> 24 & 0xFF) as u8,
            red: (argb >> 16 & 0xFF) as u8,
            green: (argb >> 8 & 0xFF) as u8,
            blue: (argb & 0xFF) as u8,
        }
    }

    /// Parses `RRGGBB` (opaque) or `AARRGGBB`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self, ModelError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let value = u32::from_str_radix(digits, 16).map_err(|_| ModelError::InvalidColor(hex.to_string()))?;
        match digits.len() {
            6 => Ok(Self::from_argb((0xFF00_0000 | value) as i32)),
            8 => Ok(Self::from_argb(value as i32)),
            _ => Err(ModelError::InvalidColor(hex.to_string())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Color{{A={}, R={}, G={}, B={}}}",
            self.alpha, self.red, self.green, self.blue
        )
    }
}

/// Interpolation timings in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "InterpolationFields")]
pub struct Interpolation {
    delay: i32,
    duration: i32,
    teleport: i32,
}

#[derive(Deserialize)]
struct InterpolationFields {
    delay: i32,
    duration: i32,
    teleport: i32,
}

impl TryFrom<InterpolationFields> for Interpolation {
    type Error = ModelError;

    fn try_from(fields: InterpolationFields) -> Result<Self, Self::Error> {
        Interpolation::new(fields.delay, fields.duration, fields.teleport)
    }
}

impl Interpolation {
    pub const NONE: Interpolation = Interpolation {
        delay: 0,
        duration: 0,
        teleport: 0,
    };

    pub fn new(delay: i32, duration: i32, teleport: i32) -> Result<Self, ModelError> {
        Ok(Self {
            delay,
            duration,
            teleport: check_range("teleport interpolation duration", teleport, 0, 59)?,
        })
    }

    pub fn delay(&self) -> i32 {
        self.delay
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn teleport(&self) -> i32 {
        self.teleport
    }
}

fn check_range(name: &'static str, value: i32, min: i32, max: i32) -> Result<i32, ModelError> {
    if value < min || value > max {
        return Err(ModelError::OutOfRange {
            name,
            min: min as i64,
            max: max as i64,
            value: value as i64,
        });
    }
    Ok(value)
}

// ============================================================================
// Model Kinds
// ============================================================================

/// Horizontal alignment of text models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Center,
    Left,
    Right,
}

/// Content and styling of a text model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub text: String,
    pub line_width: i32,
    pub background: Option<Color>,
    pub opacity: u8,
    pub shadowed: bool,
    pub see_through: bool,
    pub alignment: TextAlignment,
}

impl TextSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            line_width: 200,
            background: None,
            opacity: 255,
            shadowed: false,
            see_through: false,
            alignment: TextAlignment::Center,
        }
    }
}

/// What a model displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ModelKind {
    /// Block state string, e.g. `minecraft:stone`
    Block(String),
    /// Item key, e.g. `minecraft:diamond_sword`
    Item(String),
    Text(TextSpec),
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Block(_) => "block",
            ModelKind::Item(_) => "item",
            ModelKind::Text(_) => "text",
        }
    }

    pub fn same_kind(&self, other: &ModelKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

// ============================================================================
// Model Properties
// ============================================================================

/// Mutable render state of one model.
///
/// Every setter marks the properties dirty; adapters clear the flag once the
/// change has been flushed to viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProperties {
    pub(crate) kind: ModelKind,
    view_range: f32,
    shadow: Shadow,
    culling: Culling,
    billboard: Billboard,
    brightness: Brightness,
    glow_color: Color,
    interpolation: Interpolation,
    transform: Transform,
    invisible: bool,
    #[serde(skip)]
    dirty: bool,
}

impl ModelProperties {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            view_range: 1.0,
            shadow: Shadow {
                radius: 0.0,
                strength: 1.0,
            },
            culling: Culling::default(),
            billboard: Billboard::Fixed,
            brightness: Brightness::FULL_BRIGHT,
            glow_color: Color::transparent(),
            interpolation: Interpolation::NONE,
            transform: Transform::identity(),
            invisible: false,
            dirty: true,
        }
    }

    fn mark_dirty(&mut self) -> &mut Self {
        self.dirty = true;
        self
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by adapters once the current state was sent to viewers.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    /// Replaces the block state, item or text of the model.
    ///
    /// # Errors
    ///
    /// `ModelError::KindChange` if `content` is a different kind of model.
    pub fn set_content(&mut self, content: ModelKind) -> Result<&mut Self, ModelError> {
        if !self.kind.same_kind(&content) {
            return Err(ModelError::KindChange {
                from: self.kind.name(),
                to: content.name(),
            });
        }
        self.kind = content;
        Ok(self.mark_dirty())
    }

    pub fn view_range(&self) -> f32 {
        self.view_range
    }

    pub fn set_view_range(&mut self, view_range: f32) -> &mut Self {
        self.view_range = view_range;
        self.mark_dirty()
    }

    pub fn shadow(&self) -> Shadow {
        self.shadow
    }

    pub fn set_shadow(&mut self, radius: f32, strength: f32) -> Result<&mut Self, ModelError> {
        self.shadow = Shadow::new(radius, strength)?;
        Ok(self.mark_dirty())
    }

    pub fn culling(&self) -> Culling {
        self.culling
    }

    pub fn set_culling(&mut self, width: f32, height: f32) -> &mut Self {
        self.culling = Culling { width, height };
        self.mark_dirty()
    }

    pub fn billboard(&self) -> Billboard {
        self.billboard
    }

    pub fn set_billboard(&mut self, billboard: Billboard) -> &mut Self {
        self.billboard = billboard;
        self.mark_dirty()
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    pub fn set_brightness(&mut self, block_light: i32, sky_light: i32) -> Result<&mut Self, ModelError> {
        self.brightness = Brightness::new(block_light, sky_light)?;
        Ok(self.mark_dirty())
    }

    pub fn glow_color(&self) -> Color {
        self.glow_color
    }

    /// A transparent glow color means the model does not glow.
    pub fn set_glow_color(&mut self, color: Color) -> &mut Self {
        self.glow_color = color;
        self.mark_dirty()
    }

    pub fn is_glowing(&self) -> bool {
        self.glow_color.alpha > 0
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    pub fn set_invisible(&mut self, invisible: bool) -> &mut Self {
        self.invisible = invisible;
        self.mark_dirty()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) -> &mut Self {
        self.interpolation = interpolation;
        self.mark_dirty()
    }

    pub fn set_teleport_duration(&mut self, ticks: i32) -> Result<&mut Self, ModelError> {
        self.interpolation = Interpolation::new(
            self.interpolation.delay,
            self.interpolation.duration,
            ticks,
        )?;
        Ok(self.mark_dirty())
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) -> &mut Self {
        self.transform = transform;
        self.mark_dirty()
    }

    /// Applies `editor` to the transform and animates to the result over
    /// `duration` ticks after `delay` ticks.
    pub fn interpolate_transform(
        &mut self,
        delay: i32,
        duration: i32,
        editor: impl FnOnce(Transform) -> Transform,
    ) -> &mut Self {
        self.transform = editor(self.transform);
        self.interpolation.delay = delay;
        self.interpolation.duration = duration;
        self.mark_dirty()
    }
}
