//! Fixed time grid and named reference-pathway registries.
//!
//! The registries are process-wide immutable constants: a short code maps to a
//! full scenario identifier plus the styling the chart collaborator needs.

/// First sampled year of the ledger grid.
pub const START_YEAR: i32 = 2010;
/// Last sampled year of the ledger grid.
pub const END_YEAR: i32 = 2100;
/// Spacing between sampled years.
pub const SAMPLE_STEP: i32 = 5;

/// Sentinel year for scenarios whose emissions never cross the net-zero limit.
pub const NO_NET_ZERO: f64 = 2110.0;

/// The fixed sampled-year grid 2010, 2015, ..., 2100.
pub fn year_grid() -> Vec<i32> {
    (START_YEAR..=END_YEAR).step_by(SAMPLE_STEP as usize).collect()
}

/// One illustrative pathway (IP) registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ip {
    pub code: &'static str,
    /// Full scenario identifier (model + scenario label).
    pub scenario: &'static str,
    pub color: &'static str,
    pub symbol: &'static str,
    pub label: &'static str,
    /// Line-dash pattern; "solid" unless stated.
    pub dash: &'static str,
}

pub static IP_SCENARIOS: &[Ip] = &[
    Ip {
        code: "CurPol",
        scenario: "GCAM 5.3 NGFS2_Current Policies",
        color: "#e51f26",
        symbol: "triangle-up",
        label: "Policies implemented until<br>the end of 2020 (CurPol)",
        dash: "solid",
    },
    Ip {
        code: "ModAct",
        scenario: "IMAGE 3.0 EN_INDCi2030_3000f",
        color: "#f39121",
        symbol: "triangle-down",
        label: "Moderate Action (ModAct)",
        dash: "solid",
    },
    Ip {
        code: "GS",
        scenario: "WITCH 5.0 CO_Bridge",
        color: "#6f7799",
        symbol: "hourglass",
        label: "Gradual strengthening<br>of policies (IMP-GS)",
        dash: "solid",
    },
    Ip {
        code: "Neg",
        scenario: "COFFEE 1.1 EN_NPi2020_400f_lowBECCS",
        color: "#8fa66c",
        symbol: "circle",
        label: "Focus on negative<br>emissions (IMP-Neg)",
        dash: "solid",
    },
    Ip {
        code: "LD",
        scenario: "MESSAGEix-GLOBIOM 1.0 LowEnergyDemand_1.3_IPCC",
        color: "#4aa6c3",
        symbol: "diamond",
        label: "Focus on low demand (IMP-LD)",
        dash: "3px,2px",
    },
    Ip {
        code: "Ren",
        scenario: "REMIND-MAgPIE 2.1-4.3 DeepElec_SSP2_ HighRE_Budg900",
        color: "#2d7c8e",
        symbol: "star",
        label: "Focus on renewables (IMP-Ren)",
        dash: "5px,4px",
    },
    Ip {
        code: "SP",
        scenario: "REMIND-MAgPIE 2.1-4.2 SusDev_SDP-PkBudg1000",
        color: "#134e54",
        symbol: "cross",
        label: "Shifting pathways (IMP-SP)",
        dash: "10px,8px",
    },
];

/// One shared socioeconomic pathway (SSP) registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ssp {
    pub code: &'static str,
    /// Full scenario identifier (model + scenario label).
    pub scenario: &'static str,
    pub color: &'static str,
}

pub static SSP_SCENARIOS: &[Ssp] = &[
    Ssp { code: "SSP1-19", scenario: "IMAGE 3.0.1 SSP1-19", color: "#00B593" },
    Ssp { code: "SSP1-26", scenario: "IMAGE 3.0.1 SSP1-26", color: "#4e84d4" },
    Ssp { code: "SSP4-34", scenario: "GCAM 4.2 SSP4-34", color: "#f4a506" },
    Ssp { code: "SSP2-45", scenario: "MESSAGE-GLOBIOM 1.0 SSP2-45", color: "#e8663b" },
    Ssp { code: "SSP4-60", scenario: "GCAM 4.2 SSP4-60", color: "#9b2270" },
    Ssp { code: "SSP3-70", scenario: "AIM/CGE 2.0 SSP3-Baseline", color: "#999" },
    Ssp { code: "SSP5-85", scenario: "REMIND-MAgPIE 1.5 SSP5-Baseline", color: "#231123" },
];

/// Looks up an illustrative pathway by code.
pub fn ip(code: &str) -> Option<&'static Ip> {
    IP_SCENARIOS.iter().find(|e| e.code == code)
}

/// Looks up a shared socioeconomic pathway by code.
pub fn ssp(code: &str) -> Option<&'static Ssp> {
    SSP_SCENARIOS.iter().find(|e| e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_grid_shape() {
        let grid = year_grid();
        assert_eq!(grid.len(), 19);
        assert_eq!(grid[0], 2010);
        assert_eq!(*grid.last().unwrap(), 2100);
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(ip("LD").unwrap().scenario, "MESSAGEix-GLOBIOM 1.0 LowEnergyDemand_1.3_IPCC");
        assert!(ip("nope").is_none());
        assert_eq!(ssp("SSP2-45").unwrap().color, "#e8663b");
        assert!(ssp("SSP9-99").is_none());
    }

    #[test]
    fn test_registry_codes_unique() {
        for (i, a) in IP_SCENARIOS.iter().enumerate() {
            assert!(IP_SCENARIOS.iter().skip(i + 1).all(|b| b.code != a.code));
        }
        for (i, a) in SSP_SCENARIOS.iter().enumerate() {
            assert!(SSP_SCENARIOS.iter().skip(i + 1).all(|b| b.code != a.code));
        }
    }
}
