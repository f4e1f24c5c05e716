//! Entity model: agents, projectiles and particles.
//!
//! Components are plain data. Behavior lives in the systems, combat,
//! physics and progression modules, which all mutate these records
//! through the single [`BattleState`](crate::simulation::BattleState).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::random::RandomSource;

/// Unique identifier for agents. Equal to the agent's index in the population.
pub type AgentId = u32;

// ============================================================================
// Identity
// ============================================================================

/// The two hero identities. At most one agent per population holds each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroKind {
    /// First hero.
    Superman,
    /// Second hero.
    Batman,
}

impl HeroKind {
    /// Heroes in assignment order.
    pub const ALL: [HeroKind; 2] = [HeroKind::Superman, HeroKind::Batman];

    /// Signature color.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            HeroKind::Superman => Color::Rgb(0x1e, 0x90, 0xff),
            HeroKind::Batman => Color::Rgb(0x11, 0x11, 0x11),
        }
    }
}

/// Exclusive special tag of an agent.
///
/// Heroes take part in the instant-kill and mutual-annihilation rules.
/// The special character only differs in stats and looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Ordinary combatant.
    #[default]
    Normal,
    /// Hero with contact-kill rules.
    Hero(HeroKind),
    /// Cosmetically distinct agent with ordinary rules.
    SpecialCharacter,
}

impl AgentKind {
    /// Check if this agent is a hero.
    #[must_use]
    pub const fn is_hero(self) -> bool {
        matches!(self, AgentKind::Hero(_))
    }

    /// Hero identity, if any.
    #[must_use]
    pub const fn hero_kind(self) -> Option<HeroKind> {
        match self {
            AgentKind::Hero(kind) => Some(kind),
            _ => None,
        }
    }

    /// Maximum (and starting) hit points for this kind.
    #[must_use]
    pub const fn max_hp(self) -> i32 {
        match self {
            AgentKind::Normal => 100,
            AgentKind::Hero(_) => 200,
            AgentKind::SpecialCharacter => 140,
        }
    }

    /// Starting radius for this kind.
    #[must_use]
    pub const fn base_radius(self) -> f32 {
        match self {
            AgentKind::Normal => 8.0,
            AgentKind::Hero(_) | AgentKind::SpecialCharacter => 12.0,
        }
    }

    /// Single-letter badge drawn on special agents.
    #[must_use]
    pub const fn badge(self) -> Option<char> {
        match self {
            AgentKind::Normal => None,
            AgentKind::Hero(HeroKind::Superman) => Some('S'),
            AgentKind::Hero(HeroKind::Batman) => Some('B'),
            AgentKind::SpecialCharacter => Some('W'),
        }
    }
}

// ============================================================================
// Weapons
// ============================================================================

/// Combat role, derived from the weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatRole {
    /// Close-range swings. Faster movement.
    Melee,
    /// Fires projectiles. Slower movement.
    Ranged,
}

impl CombatRole {
    /// Base speed picked when the agent chooses a new wander heading.
    #[must_use]
    pub const fn wander_speed(self, hero: bool) -> f32 {
        match (self, hero) {
            (CombatRole::Melee, true) => 1.8,
            (CombatRole::Melee, false) => 1.2,
            (CombatRole::Ranged, true) => 0.9,
            (CombatRole::Ranged, false) => 0.6,
        }
    }

    /// Per-frame speed cap.
    #[must_use]
    pub const fn max_speed(self) -> f32 {
        match self {
            CombatRole::Melee => 2.6,
            CombatRole::Ranged => 1.4,
        }
    }
}

/// Weapon identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Single accurate shot.
    Gun,
    /// Six-pellet fan.
    Shotgun,
    /// Rapid weak shots.
    Minigun,
    /// Melee blade.
    Sword,
    /// Melee axe.
    Axe,
}

impl WeaponKind {
    /// Ranged archetypes.
    pub const RANGED: [WeaponKind; 3] = [WeaponKind::Gun, WeaponKind::Shotgun, WeaponKind::Minigun];

    /// Melee archetypes.
    pub const MELEE: [WeaponKind; 2] = [WeaponKind::Sword, WeaponKind::Axe];

    /// Role implied by this weapon.
    #[must_use]
    pub const fn role(self) -> CombatRole {
        match self {
            WeaponKind::Gun | WeaponKind::Shotgun | WeaponKind::Minigun => CombatRole::Ranged,
            WeaponKind::Sword | WeaponKind::Axe => CombatRole::Melee,
        }
    }

    /// Lowercase weapon name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            WeaponKind::Gun => "gun",
            WeaponKind::Shotgun => "shotgun",
            WeaponKind::Minigun => "minigun",
            WeaponKind::Sword => "sword",
            WeaponKind::Axe => "axe",
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a weapon delivers its damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponPattern {
    /// Projectile weapon.
    Ranged {
        /// Projectiles per shot.
        pellets: u32,
        /// Angular spacing factor between pellets.
        spread: f32,
        /// Projectile speed in pixels per frame.
        projectile_speed: f32,
    },
    /// Contact weapon.
    Melee {
        /// Extra distance beyond touching radii.
        reach: f32,
    },
}

/// A weapon loadout. The fire or swing interval lives in the agent's cooldowns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Weapon identifier.
    pub kind: WeaponKind,
    /// Flat damage per hit (per pellet for ranged weapons).
    pub damage: u32,
    /// Delivery pattern.
    pub pattern: WeaponPattern,
}

impl Weapon {
    /// Role of this weapon.
    #[must_use]
    pub const fn role(&self) -> CombatRole {
        self.kind.role()
    }

    /// Melee reach, or zero for ranged weapons.
    #[must_use]
    pub fn reach(&self) -> f32 {
        match self.pattern {
            WeaponPattern::Melee { reach } => reach,
            WeaponPattern::Ranged { .. } => 0.0,
        }
    }
}

// ============================================================================
// Timers & vitals
// ============================================================================

/// Continuous-time cooldown.
///
/// Accumulates elapsed frame units. [`is_ready`](Self::is_ready) holds once
/// the accumulated time reaches the interval and
/// [`has_elapsed`](Self::has_elapsed) once it is strictly past it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    /// Time accumulated since the last reset.
    pub elapsed: f32,
    /// Time required before the action is ready.
    pub interval: f32,
}

impl Cooldown {
    /// Create a cooldown that starts from zero.
    #[must_use]
    pub const fn new(interval: f32) -> Self {
        Self {
            elapsed: 0.0,
            interval,
        }
    }

    /// Builder method to pre-load elapsed time.
    #[must_use]
    pub const fn with_elapsed(mut self, elapsed: f32) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Accumulate elapsed time.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Whether enough time has accumulated to act.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.elapsed >= self.interval
    }

    /// Whether the accumulated time is strictly past the interval.
    #[must_use]
    pub fn has_elapsed(&self) -> bool {
        self.elapsed > self.interval
    }

    /// Restart the cooldown after acting.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Restart with a freshly drawn interval.
    pub fn reset_with_interval(&mut self, interval: f32) {
        self.elapsed = 0.0;
        self.interval = interval;
    }
}

/// Hit points. The maximum is informational; buffs never raise it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points. May go below zero on the killing blow.
    pub current: i32,
    /// Starting hit points.
    pub max: i32,
}

impl Health {
    /// Create health at full hit points.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Subtract damage and return the remaining hit points.
    pub fn apply_damage(&mut self, amount: u32) -> i32 {
        self.current = self.current.saturating_sub(amount.min(i32::MAX as u32) as i32);
        self.current
    }

    /// Check if hit points are exhausted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current <= 0
    }
}

// ============================================================================
// Cosmetics
// ============================================================================

/// Display color, rendered as a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Hue in degrees, saturation and lightness in percent.
    Hsl(u16, u8, u8),
    /// 8-bit RGB.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Projectile impact flash.
    pub const IMPACT: Color = Color::Rgb(0xff, 0xcc, 0x66);
    /// Melee hit flash.
    pub const MELEE_HIT: Color = Color::Rgb(0xff, 0x66, 0x66);
    /// Special character signature color.
    pub const SPECIAL: Color = Color::Rgb(0xe0, 0xb2, 0x4a);

    /// Bright-ish pastel color for a normal agent.
    pub fn random_pastel(rng: &mut dyn RandomSource) -> Self {
        let hue = rng.range(0.0, 360.0) as u16;
        let saturation = rng.range(60.0, 90.0) as u8;
        let lightness = rng.range(45.0, 65.0) as u8;
        Color::Hsl(hue, saturation, lightness)
    }

    /// Warm fire tone for explosion debris.
    pub fn random_fire(rng: &mut dyn RandomSource) -> Self {
        let hue = rng.range(0.0, 60.0) as u16;
        let lightness = rng.range(40.0, 60.0) as u8;
        Color::Hsl(hue, 80, lightness)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Hsl(h, s, l) => write!(f, "hsl({h} {s}% {l}%)"),
            Color::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Outline drawn for agents without a custom image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Circle.
    #[default]
    Circle,
    /// Upward triangle.
    Triangle,
    /// Axis-aligned square.
    Square,
    /// Rotated square.
    Diamond,
    /// Five-point star.
    Star,
}

impl Shape {
    /// All shapes.
    pub const ALL: [Shape; 5] = [
        Shape::Circle,
        Shape::Triangle,
        Shape::Square,
        Shape::Diamond,
        Shape::Star,
    ];

    /// Uniformly random shape.
    pub fn random(rng: &mut dyn RandomSource) -> Self {
        Self::ALL[rng.index(Self::ALL.len())]
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Triangle => "triangle",
            Shape::Square => "square",
            Shape::Diamond => "diamond",
            Shape::Star => "star",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A simulated combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier, equal to the index in the population.
    pub id: AgentId,
    /// Field position.
    pub position: Vec2,
    /// Velocity in pixels per frame.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Hit points.
    pub health: Health,
    /// Cleared exactly once, on death.
    pub alive: bool,
    /// Special tag.
    pub kind: AgentKind,
    /// Weapon loadout.
    pub weapon: Weapon,
    /// Ranged fire timer.
    pub fire: Cooldown,
    /// Melee swing timer.
    pub swing: Cooldown,
    /// Direction-change timer.
    pub wander: Cooldown,
    /// Credited kills.
    pub kills: u32,
    /// Nearest living agent found this frame.
    pub target: Option<AgentId>,
    /// Display color.
    pub color: Color,
    /// Display shape.
    pub shape: Shape,
}

impl Agent {
    /// Combat role.
    #[must_use]
    pub const fn role(&self) -> CombatRole {
        self.weapon.role()
    }

    /// Check if this agent is a hero.
    #[must_use]
    pub const fn is_hero(&self) -> bool {
        self.kind.is_hero()
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Distance between centers.
    #[must_use]
    pub fn distance_to(&self, other: &Agent) -> f32 {
        self.position.distance(other.position)
    }

    /// Whether the two agents are within `padding` of touching.
    #[must_use]
    pub fn touches(&self, other: &Agent, padding: f32) -> bool {
        self.distance_to(other) <= self.radius + other.radius + padding
    }

    /// Mark the agent dead. Dead agents never come back.
    pub fn kill(&mut self) {
        self.alive = false;
        self.target = None;
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Agent that fired this projectile.
    pub owner: AgentId,
    /// Field position.
    pub position: Vec2,
    /// Velocity in pixels per frame.
    pub velocity: Vec2,
    /// Frames left before expiry.
    pub life: u32,
    /// Flat damage on impact.
    pub damage: u32,
}

/// Visual-only debris emitted by hits, deaths and explosions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Field position.
    pub position: Vec2,
    /// Velocity in pixels per frame.
    pub velocity: Vec2,
    /// Frame units left before removal.
    pub life: f32,
    /// Display color.
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_cycle() {
        let mut cooldown = Cooldown::new(10.0);
        assert!(!cooldown.is_ready());
        cooldown.advance(6.0);
        assert!(!cooldown.is_ready());
        cooldown.advance(4.0);
        assert!(cooldown.is_ready());
        cooldown.reset();
        assert!(!cooldown.is_ready());
        cooldown.reset_with_interval(2.0);
        cooldown.advance(2.5);
        assert!(cooldown.is_ready());
    }

    #[test]
    fn test_cooldown_strict_and_inclusive_readiness() {
        let mut cooldown = Cooldown::new(5.0);
        cooldown.advance(5.0);
        assert!(cooldown.is_ready());
        assert!(!cooldown.has_elapsed());
        cooldown.advance(0.5);
        assert!(cooldown.has_elapsed());
    }

    #[test]
    fn test_health_damage_goes_negative() {
        let mut health = Health::new(15);
        assert_eq!(health.apply_damage(20), -5);
        assert!(health.is_depleted());
    }

    #[test]
    fn test_kind_stats() {
        assert_eq!(AgentKind::Normal.max_hp(), 100);
        assert_eq!(AgentKind::Hero(HeroKind::Batman).max_hp(), 200);
        assert_eq!(AgentKind::SpecialCharacter.max_hp(), 140);
        assert!(AgentKind::Hero(HeroKind::Superman).is_hero());
        assert!(!AgentKind::SpecialCharacter.is_hero());
    }

    #[test]
    fn test_role_speeds() {
        assert!(CombatRole::Melee.max_speed() > CombatRole::Ranged.max_speed());
        assert!(CombatRole::Melee.wander_speed(true) > CombatRole::Melee.wander_speed(false));
        assert_eq!(WeaponKind::Shotgun.role(), CombatRole::Ranged);
        assert_eq!(WeaponKind::Axe.role(), CombatRole::Melee);
    }

    #[test]
    fn test_color_display() {
        assert_eq!(HeroKind::Superman.color().to_string(), "#1e90ff");
        assert_eq!(Color::Hsl(120, 70, 50).to_string(), "hsl(120 70% 50%)");
    }
}
