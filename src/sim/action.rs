use std::fmt;

use serde::Serialize;

use crate::error::{Result, SimError};

/// Number of TCL dispatch buckets.
pub const TCL_BUCKETS: u8 = 4;
/// Number of consumer price tiers.
pub const PRICE_TIERS: u8 = 5;
/// Size of the flattened action space (4 x 5 x 2 x 2).
pub const ACTION_COUNT: usize = 80;

/// One hour's decision for the microgrid.
///
/// Fields are only reachable through validated constructors, so a held
/// `Action` is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Action {
    tcl_bucket: u8,
    price_tier: u8,
    deficiency: bool,
    excess: bool,
}

impl Action {
    /// Builds an action from its four components.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidAction` if `tcl_bucket > 3` or `price_tier > 4`.
    pub fn new(tcl_bucket: u8, price_tier: u8, deficiency: bool, excess: bool) -> Result<Self> {
        if tcl_bucket >= TCL_BUCKETS {
            return Err(SimError::InvalidAction(format!(
                "tcl_bucket {tcl_bucket} outside 0..{TCL_BUCKETS}"
            )));
        }
        if price_tier >= PRICE_TIERS {
            return Err(SimError::InvalidAction(format!(
                "price_tier {price_tier} outside 0..{PRICE_TIERS}"
            )));
        }
        Ok(Self {
            tcl_bucket,
            price_tier,
            deficiency,
            excess,
        })
    }

    /// Decodes a flat index in `0..80`.
    ///
    /// Enumeration order, outermost first: tcl_bucket, price_tier,
    /// deficiency flag, excess flag.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidAction` if `index >= 80`.
    pub fn from_index(index: usize) -> Result<Self> {
        if index >= ACTION_COUNT {
            return Err(SimError::InvalidAction(format!(
                "index {index} outside 0..{ACTION_COUNT}"
            )));
        }
        let excess = index % 2 == 1;
        let deficiency = (index / 2) % 2 == 1;
        let price_tier = ((index / 4) % PRICE_TIERS as usize) as u8;
        let tcl_bucket = (index / 20) as u8;
        Self::new(tcl_bucket, price_tier, deficiency, excess)
    }

    /// Flat index of this action; inverse of [`Action::from_index`].
    pub fn index(&self) -> usize {
        self.tcl_bucket as usize * 20
            + self.price_tier as usize * 4
            + usize::from(self.deficiency) * 2
            + usize::from(self.excess)
    }

    /// Every action in enumeration order.
    pub fn all() -> impl Iterator<Item = Action> {
        (0..TCL_BUCKETS).flat_map(|i| {
            (0..PRICE_TIERS).flat_map(move |j| {
                [false, true].into_iter().flat_map(move |k| {
                    [false, true].into_iter().map(move |l| Action {
                        tcl_bucket: i,
                        price_tier: j,
                        deficiency: k,
                        excess: l,
                    })
                })
            })
        })
    }

    pub fn tcl_bucket(&self) -> u8 {
        self.tcl_bucket
    }

    pub fn price_tier(&self) -> u8 {
        self.price_tier
    }

    /// Cover deficits from the battery before buying from the grid.
    pub fn deficiency(&self) -> bool {
        self.deficiency
    }

    /// Store surpluses in the battery before selling to the grid.
    pub fn excess(&self) -> bool {
        self.excess
    }
}

impl TryFrom<[u8; 4]> for Action {
    type Error = SimError;

    /// Converts `[tcl_bucket, price_tier, deficiency, excess]`; flags must be 0 or 1.
    fn try_from(raw: [u8; 4]) -> Result<Self> {
        let flag = |name: &str, v: u8| match v {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SimError::InvalidAction(format!("{name} flag {v} is not 0 or 1"))),
        };
        Self::new(
            raw[0],
            raw[1],
            flag("deficiency", raw[2])?,
            flag("excess", raw[3])?,
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{},{}]",
            self.tcl_bucket,
            self.price_tier,
            u8::from(self.deficiency),
            u8::from(self.excess)
        )
    }
}
