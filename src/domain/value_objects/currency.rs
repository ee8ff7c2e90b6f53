//! Currency bundles and starting-wealth decisions

use serde::{Deserialize, Serialize};

/// Where a piece of starting equipment (or wealth in lieu of it) comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSource {
    Background,
    Class,
}

impl EquipmentSource {
    pub const ALL: [EquipmentSource; 2] = [EquipmentSource::Background, EquipmentSource::Class];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentSource::Background => "background",
            EquipmentSource::Class => "class",
        }
    }
}

impl std::fmt::Display for EquipmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Denomination {
    Cp,
    Sp,
    Ep,
    Gp,
    Pp,
}

impl std::str::FromStr for Denomination {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cp" => Ok(Denomination::Cp),
            "sp" => Ok(Denomination::Sp),
            "ep" => Ok(Denomination::Ep),
            "gp" => Ok(Denomination::Gp),
            "pp" => Ok(Denomination::Pp),
            _ => Err(()),
        }
    }
}

/// Coin counts per denomination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub cp: u64,
    pub sp: u64,
    pub ep: u64,
    pub gp: u64,
    pub pp: u64,
}

impl Currency {
    pub fn of(denomination: Denomination, amount: u64) -> Self {
        let mut currency = Self::default();
        match denomination {
            Denomination::Cp => currency.cp = amount,
            Denomination::Sp => currency.sp = amount,
            Denomination::Ep => currency.ep = amount,
            Denomination::Gp => currency.gp = amount,
            Denomination::Pp => currency.pp = amount,
        }
        currency
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Currency {
    /// `None` if any denomination would overflow
    pub fn checked_add(self, rhs: Currency) -> Option<Currency> {
        Some(Currency {
            cp: self.cp.checked_add(rhs.cp)?,
            sp: self.sp.checked_add(rhs.sp)?,
            ep: self.ep.checked_add(rhs.ep)?,
            gp: self.gp.checked_add(rhs.gp)?,
            pp: self.pp.checked_add(rhs.pp)?,
        })
    }

    pub fn saturating_add(self, rhs: Currency) -> Currency {
        Currency {
            cp: self.cp.saturating_add(rhs.cp),
            sp: self.sp.saturating_add(rhs.sp),
            ep: self.ep.saturating_add(rhs.ep),
            gp: self.gp.saturating_add(rhs.gp),
            pp: self.pp.saturating_add(rhs.pp),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = [
            (self.pp, "pp"),
            (self.gp, "gp"),
            (self.ep, "ep"),
            (self.sp, "sp"),
            (self.cp, "cp"),
        ]
        .iter()
        .filter(|(amount, _)| *amount > 0)
        .map(|(amount, label)| format!("{amount} {label}"))
        .collect();

        if parts.is_empty() {
            f.write_str("0 gp")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Per-source choice between rolled wealth and starting equipment.
/// When `use_wealth` is set, no equipment is collected from that source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WealthDecision {
    pub source: EquipmentSource,
    pub use_wealth: bool,
    pub currency: Option<Currency>,
}

impl WealthDecision {
    pub fn equipment(source: EquipmentSource) -> Self {
        Self {
            source,
            use_wealth: false,
            currency: None,
        }
    }

    pub fn wealth(source: EquipmentSource, currency: Currency) -> Self {
        Self {
            source,
            use_wealth: true,
            currency: Some(currency),
        }
    }
}
