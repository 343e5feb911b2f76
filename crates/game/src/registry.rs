use serde::{Deserialize, Serialize};

/// Wire codes are append-only: a code is never reused while any build that
/// understands it is still deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum EntityKind {
    #[default]
    Player = 0,
    Zombie = 1,
    Projectile = 2,
    Tree = 3,
    Wall = 4,
    Pickup = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExtensionKind {
    Position = 0,
    Motion = 1,
    Health = 2,
    Inventory = 3,
    Illumination = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ItemKind {
    Wood = 0,
    Stone = 1,
    Axe = 2,
    Pickaxe = 3,
    Apple = 4,
    Torch = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    Hello = 0,
    AssignIdentity = 1,
    MapData = 2,
    GameState = 3,
    FullStateRequest = 4,
    Disconnect = 5,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown {registry} name: {name}")]
    UnknownName {
        registry: &'static str,
        name: String,
    },
}

macro_rules! registry {
    ($ty:ident, $label:literal, [$(($variant:ident, $name:literal)),+ $(,)?]) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn code(self) -> u8 {
                self as u8
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $(c if c == $ty::$variant as u8 => Some($ty::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Result<Self, RegistryError> {
                match name {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(RegistryError::UnknownName {
                        registry: $label,
                        name: name.to_string(),
                    }),
                }
            }
        }
    };
}

registry!(EntityKind, "entity", [
    (Player, "player"),
    (Zombie, "zombie"),
    (Projectile, "projectile"),
    (Tree, "tree"),
    (Wall, "wall"),
    (Pickup, "pickup"),
]);

registry!(ExtensionKind, "extension", [
    (Position, "position"),
    (Motion, "motion"),
    (Health, "health"),
    (Inventory, "inventory"),
    (Illumination, "illumination"),
]);

registry!(ItemKind, "item", [
    (Wood, "wood"),
    (Stone, "stone"),
    (Axe, "axe"),
    (Pickaxe, "pickaxe"),
    (Apple, "apple"),
    (Torch, "torch"),
]);

registry!(EventKind, "event", [
    (Hello, "hello"),
    (AssignIdentity, "assign_identity"),
    (MapData, "map_data"),
    (GameState, "game_state"),
    (FullStateRequest, "full_state_request"),
    (Disconnect, "disconnect"),
]);

/// FNV-1a over every (code, name) pair of all four registries. Client and
/// server exchange this at connect time; a mismatch means the builds do not
/// agree on what the wire codes mean and the connection must not proceed.
pub fn registry_hash() -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    let mut feed = |byte: u8| {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    };

    for kind in EntityKind::ALL {
        feed(kind.code());
        kind.name().bytes().for_each(&mut feed);
    }
    for kind in ExtensionKind::ALL {
        feed(kind.code());
        kind.name().bytes().for_each(&mut feed);
    }
    for kind in ItemKind::ALL {
        feed(kind.code());
        kind.name().bytes().for_each(&mut feed);
    }
    for kind in EventKind::ALL {
        feed(kind.code());
        kind.name().bytes().for_each(&mut feed);
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_code(kind.code()), Some(*kind));
        }
        for kind in ExtensionKind::ALL {
            assert_eq!(ExtensionKind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(EntityKind::from_code(200), None);
        assert_eq!(ExtensionKind::from_code(200), None);
    }

    #[test]
    fn names_roundtrip() {
        assert_eq!(EntityKind::from_name("zombie").unwrap(), EntityKind::Zombie);
        assert_eq!(
            ExtensionKind::from_name("illumination").unwrap(),
            ExtensionKind::Illumination
        );
        assert!(EntityKind::from_name("dragon").is_err());
    }

    #[test]
    fn hash_is_stable_within_a_build() {
        assert_eq!(registry_hash(), registry_hash());
        assert_ne!(registry_hash(), 0);
    }
}
