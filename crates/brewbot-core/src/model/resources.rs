// ── Resource model ──
//
// Bean and water quantities, boiler temperature and cup sensors. Every
// mutation of a quantity goes through `apply_sensor_update`, which clamps
// into range and recomputes the derived percentages in the same step.

use brewbot_api::MachineStatus;

/// Water tank capacity in mL.
pub const MAX_WATER_ML: f64 = 1000.0;
/// Bean hopper capacity in g.
pub const MAX_BEAN_G: f64 = 75.0;
/// Beans consumed when a grind starts.
pub const BEANS_PER_BREW_G: f64 = 15.0;
/// Water consumed when dispensing starts.
pub const WATER_PER_BREW_ML: f64 = 250.0;
/// Boiler temperature at rest.
pub const AMBIENT_TEMP_C: f64 = 22.0;
/// Boiler temperature once heated.
pub const BREW_TEMP_C: f64 = 95.0;
/// Hopper contents at controller startup.
pub const INITIAL_BEAN_G: f64 = 60.0;
/// Tank contents at controller startup.
pub const INITIAL_WATER_ML: f64 = 800.0;
/// `water_level` at or below this raises `water_level_warning`.
pub const WATER_LEVEL_WARNING_PERCENT: u8 = 10;

/// Convert a 0–100 tank percentage into mL, clamped to capacity.
pub fn percent_to_water_ml(percent: f64) -> f64 {
    (percent / 100.0 * MAX_WATER_ML).clamp(0.0, MAX_WATER_ML)
}

/// Convert a 0–100 hopper percentage into grams, clamped to capacity.
pub fn percent_to_bean_g(percent: f64) -> f64 {
    (percent / 100.0 * MAX_BEAN_G).clamp(0.0, MAX_BEAN_G)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn percent_of(value: f64, max: f64) -> u8 {
    // Clamped to 0..=100 first, so the cast cannot truncate.
    (value / max * 100.0).round().clamp(0.0, 100.0) as u8
}

// ── SensorUpdate ────────────────────────────────────────────────────

/// A batch of sensor readings. Deltas are added; the temperature
/// replaces the current reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorUpdate {
    pub water_delta: Option<f64>,
    pub bean_delta: Option<f64>,
    pub temp_absolute: Option<f64>,
}

impl SensorUpdate {
    pub fn water(delta: f64) -> Self {
        Self {
            water_delta: Some(delta),
            ..Self::default()
        }
    }

    pub fn beans(delta: f64) -> Self {
        Self {
            bean_delta: Some(delta),
            ..Self::default()
        }
    }

    pub fn temperature(celsius: f64) -> Self {
        Self {
            temp_absolute: Some(celsius),
            ..Self::default()
        }
    }
}

// ── MachineState ────────────────────────────────────────────────────

/// The single authoritative machine state, owned by the controller task.
///
/// Fields are private: the derived levels are recomputed on every
/// quantity mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineState {
    status: MachineStatus,
    bean_weight: f64,
    water_weight: f64,
    boiler_temp: f64,
    flow_rate: f64,
    error_message: String,
    grinder_cup_detected: bool,
    dispenser_cup_detected: bool,
    water_level: u8,
    bean_level: u8,
    water_level_warning: bool,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new(INITIAL_BEAN_G, INITIAL_WATER_ML)
    }
}

impl MachineState {
    /// An idle machine at ambient temperature with no cups present.
    /// Quantities outside their range are clamped.
    pub fn new(bean_g: f64, water_ml: f64) -> Self {
        let mut state = Self {
            status: MachineStatus::Idle,
            bean_weight: 0.0,
            water_weight: 0.0,
            boiler_temp: AMBIENT_TEMP_C,
            flow_rate: 0.0,
            error_message: String::new(),
            grinder_cup_detected: false,
            dispenser_cup_detected: false,
            water_level: 0,
            bean_level: 0,
            water_level_warning: true,
        };
        state.apply_sensor_update(SensorUpdate {
            water_delta: Some(water_ml),
            bean_delta: Some(bean_g),
            temp_absolute: None,
        });
        state
    }

    /// Apply sensor readings, clamp both quantities into `[0, MAX]` and
    /// recompute the derived levels. Non-finite values are ignored.
    pub fn apply_sensor_update(&mut self, update: SensorUpdate) {
        if let Some(delta) = update.water_delta.filter(|d| d.is_finite()) {
            self.water_weight = (self.water_weight + delta).clamp(0.0, MAX_WATER_ML);
        }
        if let Some(delta) = update.bean_delta.filter(|d| d.is_finite()) {
            self.bean_weight = (self.bean_weight + delta).clamp(0.0, MAX_BEAN_G);
        }
        if let Some(temp) = update.temp_absolute.filter(|t| t.is_finite()) {
            self.boiler_temp = temp;
        }
        self.recompute_levels();
    }

    /// Replace the water quantity outright (override channel).
    pub fn set_water_ml(&mut self, ml: f64) {
        if ml.is_finite() {
            self.water_weight = ml.clamp(0.0, MAX_WATER_ML);
            self.recompute_levels();
        }
    }

    /// Replace the bean quantity outright (override channel).
    pub fn set_bean_g(&mut self, grams: f64) {
        if grams.is_finite() {
            self.bean_weight = grams.clamp(0.0, MAX_BEAN_G);
            self.recompute_levels();
        }
    }

    fn recompute_levels(&mut self) {
        self.water_level = percent_of(self.water_weight, MAX_WATER_ML);
        self.bean_level = percent_of(self.bean_weight, MAX_BEAN_G);
        self.water_level_warning = self.water_level <= WATER_LEVEL_WARNING_PERCENT;
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Move to `status`. Leaving `ERROR` clears the error message.
    pub(crate) fn set_status(&mut self, status: MachineStatus) {
        self.status = status;
        if status != MachineStatus::Error {
            self.error_message.clear();
        }
    }

    /// Move to `ERROR` with a human-readable reason.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = MachineStatus::Error;
        self.error_message = message.into();
    }

    pub(crate) fn set_flow_rate(&mut self, ml_per_sec: f64) {
        self.flow_rate = ml_per_sec.max(0.0);
    }

    pub(crate) fn set_cups(&mut self, grinder: Option<bool>, dispenser: Option<bool>) {
        if let Some(present) = grinder {
            self.grinder_cup_detected = present;
        }
        if let Some(present) = dispenser {
            self.dispenser_cup_detected = present;
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn bean_weight(&self) -> f64 {
        self.bean_weight
    }

    pub fn water_weight(&self) -> f64 {
        self.water_weight
    }

    pub fn boiler_temp(&self) -> f64 {
        self.boiler_temp
    }

    pub fn flow_rate(&self) -> f64 {
        self.flow_rate
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn grinder_cup_detected(&self) -> bool {
        self.grinder_cup_detected
    }

    pub fn dispenser_cup_detected(&self) -> bool {
        self.dispenser_cup_detected
    }

    pub fn water_level(&self) -> u8 {
        self.water_level
    }

    pub fn bean_level(&self) -> u8 {
        self.bean_level
    }

    pub fn water_level_warning(&self) -> bool {
        self.water_level_warning
    }
}
