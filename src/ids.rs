//! Small bounded indices into the fixed tables of the dive state.
//!
//! Each id is validated at construction. `clamped` maps any out-of-range raw
//! value to index 0 so that table lookups can never go out of bounds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! bounded_id {
    ($(#[$meta:meta])* $name:ident, $count:expr) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(u8);

        impl $name {
            pub const COUNT: usize = $count;

            pub const fn new(raw: u8) -> Option<Self> {
                if (raw as usize) < $count { Some(Self(raw)) } else { None }
            }

            pub const fn clamped(raw: u8) -> Self {
                if (raw as usize) < $count { Self(raw) } else { Self(0) }
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub const fn raw(self) -> u8 {
                self.0
            }

            pub fn all() -> impl Iterator<Item = Self> {
                (0..$count as u8).map(Self)
            }
        }
    };
}

bounded_id!(
    /// Slot in the gas table. Slot 0 is the manually entered gas, 1..=5 the configured mixes.
    GasId,
    6
);
bounded_id!(ScrubberId, 2);
bounded_id!(
    /// Physical oxygen sensor channel.
    SensorId,
    3
);

#[test]
fn test_clamped_out_of_range() {
    assert_eq!(GasId::clamped(9), GasId::clamped(0));
    assert_eq!(GasId::clamped(5).index(), 5);
    assert_eq!(ScrubberId::clamped(2).index(), 0);
    assert!(SensorId::new(3).is_none());
    assert_eq!(SensorId::all().count(), 3);
}
