//! Entity kinds and reporting variables of a SWMM output file.
//!
//! Each period block stores, per entity kind, a fixed ordered list of
//! scalar attributes. Pollutant concentrations always occupy the final
//! slots of the subcatchment, node and link orderings, one per tracked
//! pollutant, so the column count in a file is the fixed count plus the
//! pollutant count.

/// The four result blocks of a period, in file order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ElementKind {
    Subcatch = 0,
    Node = 1,
    Link = 2,
    System = 3,
}

/// Selects which population [`project_size`](crate::SwmmOutput::project_size)
/// reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElementCount {
    Subcatchments,
    Nodes,
    Links,
    Pollutants,
}

/// Reporting variables of a subcatchment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubcatchAttribute {
    /// Rainfall rate (in/hr or mm/hr).
    Rainfall,
    /// Snow depth (in or mm).
    SnowDepth,
    /// Evaporation loss rate (in/hr or mm/hr).
    EvapLoss,
    /// Infiltration loss rate (in/hr or mm/hr).
    InfilLoss,
    /// Runoff rate (flow units).
    RunoffRate,
    /// Groundwater outflow rate (flow units).
    GwOutflowRate,
    /// Groundwater table elevation (ft or m).
    GwTableElev,
    /// Unsaturated zone moisture content.
    SoilMoisture,
    /// Concentration of the n-th tracked pollutant.
    PollutantConc(usize),
}

impl SubcatchAttribute {
    pub(crate) const FIXED_COUNT: usize = 8;

    /// Column ordinal within a subcatchment row.
    pub fn index(self) -> usize {
        match self {
            SubcatchAttribute::Rainfall => 0,
            SubcatchAttribute::SnowDepth => 1,
            SubcatchAttribute::EvapLoss => 2,
            SubcatchAttribute::InfilLoss => 3,
            SubcatchAttribute::RunoffRate => 4,
            SubcatchAttribute::GwOutflowRate => 5,
            SubcatchAttribute::GwTableElev => 6,
            SubcatchAttribute::SoilMoisture => 7,
            SubcatchAttribute::PollutantConc(n) => Self::FIXED_COUNT + n,
        }
    }
}

/// Reporting variables of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeAttribute {
    /// Water depth above invert (ft or m).
    InvertDepth,
    /// Hydraulic head (ft or m).
    HydraulicHead,
    /// Stored and ponded volume (ft3 or m3).
    StoredPondedVolume,
    /// Lateral inflow (flow units).
    LateralInflow,
    /// Lateral plus upstream inflow (flow units).
    TotalInflow,
    /// Flow lost to flooding (flow units).
    FloodingLosses,
    /// Concentration of the n-th tracked pollutant.
    PollutantConc(usize),
}

impl NodeAttribute {
    pub(crate) const FIXED_COUNT: usize = 6;

    /// Column ordinal within a node row.
    pub fn index(self) -> usize {
        match self {
            NodeAttribute::InvertDepth => 0,
            NodeAttribute::HydraulicHead => 1,
            NodeAttribute::StoredPondedVolume => 2,
            NodeAttribute::LateralInflow => 3,
            NodeAttribute::TotalInflow => 4,
            NodeAttribute::FloodingLosses => 5,
            NodeAttribute::PollutantConc(n) => Self::FIXED_COUNT + n,
        }
    }
}

/// Reporting variables of a link.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkAttribute {
    /// Flow rate (flow units).
    FlowRate,
    /// Flow depth (ft or m).
    FlowDepth,
    /// Flow velocity (ft/s or m/s).
    FlowVelocity,
    /// Flow volume (ft3 or m3).
    FlowVolume,
    /// Fraction of the conduit filled.
    Capacity,
    /// Concentration of the n-th tracked pollutant.
    PollutantConc(usize),
}

impl LinkAttribute {
    pub(crate) const FIXED_COUNT: usize = 5;

    /// Column ordinal within a link row.
    pub fn index(self) -> usize {
        match self {
            LinkAttribute::FlowRate => 0,
            LinkAttribute::FlowDepth => 1,
            LinkAttribute::FlowVelocity => 2,
            LinkAttribute::FlowVolume => 3,
            LinkAttribute::Capacity => 4,
            LinkAttribute::PollutantConc(n) => Self::FIXED_COUNT + n,
        }
    }
}

/// Reporting variables of the run-wide system aggregate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SystemAttribute {
    /// Air temperature (deg F or deg C).
    AirTemp = 0,
    /// Rainfall rate (in/hr or mm/hr).
    Rainfall = 1,
    /// Snow depth (in or mm).
    SnowDepth = 2,
    /// Evaporation and infiltration loss rate (in/hr or mm/hr).
    EvapInfilLoss = 3,
    /// Runoff flow (flow units).
    RunoffFlow = 4,
    /// Dry weather inflow (flow units).
    DryWeatherInflow = 5,
    /// Groundwater inflow (flow units).
    GroundwaterInflow = 6,
    /// Rainfall-derived infiltration and inflow (flow units).
    RdiiInflow = 7,
    /// User defined direct inflow (flow units).
    DirectInflow = 8,
    /// Sum of the five inflow components (flow units).
    TotalLateralInflow = 9,
    /// Flow lost to flooding (flow units).
    FloodLosses = 10,
    /// Outfall discharge (flow units).
    OutfallFlows = 11,
    /// Stored volume (ft3 or m3).
    VolumeStored = 12,
    /// Evaporation rate (in/day or mm/day).
    EvapRate = 13,
}

impl SystemAttribute {
    /// Column ordinal within the system block.
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pollutant_columns_follow_the_fixed_ones() {
        assert_eq!(SubcatchAttribute::SoilMoisture.index(), 7);
        assert_eq!(SubcatchAttribute::PollutantConc(0).index(), 8);
        assert_eq!(NodeAttribute::PollutantConc(1).index(), 7);
        assert_eq!(LinkAttribute::Capacity.index(), 4);
        assert_eq!(LinkAttribute::PollutantConc(0).index(), 5);
        assert_eq!(SystemAttribute::EvapRate.index(), 13);
    }
}
