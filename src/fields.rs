//! Closed catalogue of tracked entity fields.
//!
//! Every field has a stable wire name that never changes between
//! releases; the remote collector keys on it. Noisy fields belong to a
//! [`FieldGroup`] that has to be switched on in
//! [`ReportConfig`](crate::config::ReportConfig) before it is reported.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opt-in groups of high-churn fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Position,
    Motion,
    DistanceWalked,
    Collision,
    ChunkCoords,
    Movement,
    Flight,
    Size,
    Dimension,
    Water,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown field key: {0}")]
pub struct UnknownFieldKey(pub String);

macro_rules! field_keys {
    (@group) => { None };
    (@group $group:ident) => { Some(FieldGroup::$group) };
    ($($variant:ident => $wire:literal $(in $group:ident)?,)*) => {
        /// A tracked field, identified on the wire by [`FieldKey::as_str`].
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum FieldKey {
            $($variant,)*
        }

        impl FieldKey {
            /// Every known field, in declaration order.
            pub const ALL: &'static [FieldKey] = &[$(FieldKey::$variant,)*];

            /// Stable wire name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(FieldKey::$variant => $wire,)*
                }
            }

            /// The opt-in group this field belongs to, if any.
            pub fn group(self) -> Option<FieldGroup> {
                match self {
                    $(FieldKey::$variant => field_keys!(@group $($group)?),)*
                }
            }
        }

        impl FromStr for FieldKey {
            type Err = UnknownFieldKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(FieldKey::$variant),)*
                    other => Err(UnknownFieldKey(other.to_string())),
                }
            }
        }
    };
}

field_keys! {
    ActivePotionEffects => "ActivePotionEffects",
    AddedToChunk => "addedToChunk",
    Air => "Air",
    ArrowHitTimer => "arrowHitTimer",
    AttackedAtYaw => "attackedAtYaw",
    BedLocation => "bedLocation",
    CaptureDrops => "captureDrops",
    ChunkCoordX => "chunkCoordX" in ChunkCoords,
    ChunkCoordY => "chunkCoordY" in ChunkCoords,
    ChunkCoordZ => "chunkCoordZ" in ChunkCoords,
    Collided => "collided" in Collision,
    CollidedHorizontally => "collidedHorizontally" in Collision,
    CollidedVertically => "collidedVertically" in Collision,
    DeathCount => "deathCount",
    Dimension => "dimension" in Dimension,
    DistanceWalkedModified => "distanceWalkedModified" in DistanceWalked,
    EntityCollisionReduction => "entityCollisionReduction",
    ExperienceLevel => "experienceLevel",
    ExperienceProgress => "experienceProgress",
    FallDistance => "fallDistance" in Flight,
    FoodLevel => "FoodLevel",
    ForceSpawn => "forceSpawn",
    Health => "Health",
    Height => "height" in Size,
    HeldItemMainhand => "HeldItemMainhand",
    HeldItemOffhand => "HeldItemOffhand",
    IgnoreFrustumCheck => "ignoreFrustumCheck",
    IsAirBorne => "isAirBorne" in Flight,
    IsBeingRidden => "isBeingRidden",
    IsBurning => "isBurning",
    IsDead => "isDead",
    IsEntityAlive => "isEntityAlive",
    IsEntityInsideOpaqueBlock => "isEntityInsideOpaqueBlock",
    IsGlowing => "isGlowing",
    IsHurt => "isHurt",
    IsImmuneToExplosions => "isImmuneToExplosions",
    IsInLava => "isInLava",
    IsInvisible => "isInvisible",
    IsInvulnerable => "IsInvulnerable",
    IsInWater => "isInWater" in Water,
    IsNonBoss => "isNonBoss",
    IsOutsideBorder => "isOutsideBorder",
    IsOverWater => "isOverWater" in Water,
    IsPushedByWater => "isPushedByWater" in Water,
    IsRiding => "isRiding",
    IsSilent => "isSilent",
    IsSneaking => "isSneaking" in Movement,
    IsSprinting => "isSprinting" in Movement,
    IsThirsty => "isThirsty",
    IsWet => "isWet",
    MaxFallHeight => "MaxFallHeight",
    MaxHealth => "MaxHealth",
    MaxHurtResistantTime => "maxHurtResistantTime",
    MaxHurtTime => "maxHurtTime",
    MotionX => "motionX" in Motion,
    MotionY => "motionY" in Motion,
    MotionZ => "motionZ" in Motion,
    MoveForward => "moveForward" in Movement,
    MoveStrafing => "moveStrafing" in Movement,
    MoveVertical => "moveVertical" in Movement,
    Name => "Name",
    NoClip => "noClip",
    OnGround => "onGround" in Flight,
    PersistentId => "PersistentID",
    PosX => "posX" in Position,
    PosY => "posY" in Position,
    PosZ => "posZ" in Position,
    PreventEntitySpawning => "preventEntitySpawning",
    RandomUnused1 => "randomUnused1",
    RandomUnused2 => "randomUnused2",
    RandomYawVelocity => "randomYawVelocity",
    SaturationLevel => "SaturationLevel",
    Score => "Score",
    ServerPosX => "serverPosX",
    ServerPosY => "serverPosY",
    ServerPosZ => "serverPosZ",
    StepHeight => "stepHeight",
    TemperatureLevel => "TemperatureLevel",
    ThirstLevel => "ThirstLevel",
    TicksElytraFlying => "TicksElytraFlying",
    TimeUntilPortal => "timeUntilPortal",
    TotalArmorValue => "TotalArmorValue",
    UniqueId => "UniqueID",
    UpdateBlocked => "updateBlocked",
    VelocityChanged => "velocityChanged",
    Width => "width" in Size,
    YOffset => "YOffset",
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_wire_names_are_unique() {
        let names: HashSet<_> = FieldKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), FieldKey::ALL.len());
    }

    #[test]
    fn test_parse_round_trips_every_key() {
        for key in FieldKey::ALL {
            assert_eq!(key.as_str().parse::<FieldKey>().unwrap(), *key);
        }
        assert!("health".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_groups() {
        assert_eq!(FieldKey::PosY.group(), Some(FieldGroup::Position));
        assert_eq!(FieldKey::IsSprinting.group(), Some(FieldGroup::Movement));
        assert_eq!(FieldKey::Health.group(), None);
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&FieldKey::PersistentId).unwrap();
        assert_eq!(json, "\"PersistentID\"");
        let back: FieldKey = serde_json::from_str("\"FoodLevel\"").unwrap();
        assert_eq!(back, FieldKey::FoodLevel);
    }
}
