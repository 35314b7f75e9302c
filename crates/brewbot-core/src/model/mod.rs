// ── Domain model ──
//
// Controller-side machine state. Clients never see these types directly;
// they receive `StatusResponse` snapshots built in `convert`.

pub mod resources;

pub use resources::{
    AMBIENT_TEMP_C, BEANS_PER_BREW_G, BREW_TEMP_C, INITIAL_BEAN_G, INITIAL_WATER_ML, MAX_BEAN_G,
    MAX_WATER_ML, MachineState, SensorUpdate, WATER_LEVEL_WARNING_PERCENT, WATER_PER_BREW_ML,
    percent_to_bean_g, percent_to_water_ml,
};
