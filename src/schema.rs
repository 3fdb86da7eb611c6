//! Feature schema for the claim model.
//!
//! Lists every input column the stored preprocessor was fitted on, in the
//! order the form presents them, together with the form label and the
//! numeric bounds or select options offered to the operator.

/// How a field is collected and checked on the form
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Numeric {
        min: f64,
        max: Option<f64>,
        default: f64,
        /// Rendered as an integer input (`step=1`)
        integer: bool,
    },
    Categorical {
        options: &'static [&'static str],
    },
}

/// A single model input column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Numeric { .. })
    }
}

const fn real(name: &'static str, label: &'static str, min: f64, max: Option<f64>, default: f64) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Numeric {
            min,
            max,
            default,
            integer: false,
        },
    }
}

const fn int(name: &'static str, label: &'static str, min: f64, max: Option<f64>, default: f64) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Numeric {
            min,
            max,
            default,
            integer: true,
        },
    }
}

const fn select(name: &'static str, label: &'static str, options: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Categorical { options },
    }
}

const YES_NO: &[&str] = &["Yes", "No"];

const NUMERIC_FIELDS: [FieldSpec; 15] = [
    real("policy_tenure", "Policy Tenure (years)", 0.0, Some(10.0), 1.0),
    real("age_of_car", "Age of Car (years)", 0.0, Some(20.0), 5.0),
    int("age_of_policyholder", "Age of Policyholder", 18.0, Some(100.0), 30.0),
    int("population_density", "Population Density", 0.0, None, 10000.0),
    int("gross_weight", "Gross Weight (kg)", 0.0, None, 1200.0),
    int("ncap_rating", "NCAP Rating", 0.0, Some(5.0), 3.0),
    int("displacement", "Displacement (cc)", 0.0, None, 1200.0),
    int("cylinder", "Cylinders", 1.0, Some(12.0), 4.0),
    int("gear_box", "Gear Box (speeds)", 1.0, Some(10.0), 5.0),
    real("turning_radius", "Turning Radius (m)", 0.0, None, 5.0),
    int("length", "Vehicle Length (mm)", 0.0, None, 4000.0),
    int("width", "Vehicle Width (mm)", 0.0, None, 1800.0),
    int("height", "Vehicle Height (mm)", 0.0, None, 1500.0),
    real("max_torque", "Max Torque (Nm)", 0.0, None, 150.0),
    real("max_power", "Max Power (bhp)", 0.0, None, 100.0),
];

const CATEGORICAL_FIELDS: [FieldSpec; 27] = [
    select("area_cluster", "Area Cluster", &["C1", "C2", "C3", "C4", "C5", "C6", "C7", "C8"]),
    select("make", "Make", &["1", "2", "3", "4", "5"]),
    select("segment", "Segment", &["A", "B1", "B2", "C1", "C2", "Utility"]),
    select(
        "model",
        "Model",
        &["M1", "M2", "M3", "M4", "M5", "M6", "M7", "M8", "M9", "M10", "M11"],
    ),
    select("fuel_type", "Fuel Type", &["Petrol", "Diesel", "CNG"]),
    select(
        "engine_type",
        "Engine Type",
        &["1.2 Petrol", "1.5 Diesel", "1.0 Petrol", "CNG"],
    ),
    select("airbags", "Airbags", &["1", "2", "4", "6"]),
    select("is_esc", "ESC (Electronic Stability Control)", YES_NO),
    select("is_adjustable_steering", "Adjustable Steering", YES_NO),
    select("is_tpms", "TPMS (Tire Pressure Monitoring)", YES_NO),
    select("is_parking_sensors", "Parking Sensors", YES_NO),
    select("is_parking_camera", "Parking Camera", YES_NO),
    select("rear_brakes_type", "Rear Brakes Type", &["Drum", "Disc"]),
    select("transmission_type", "Transmission Type", &["Manual", "Automatic"]),
    select("steering_type", "Steering Type", &["Power", "Electric", "Manual"]),
    select("is_front_fog_lights", "Front Fog Lights", YES_NO),
    select("is_rear_window_wiper", "Rear Window Wiper", YES_NO),
    select("is_rear_window_washer", "Rear Window Washer", YES_NO),
    select("is_rear_window_defogger", "Rear Window Defogger", YES_NO),
    select("is_brake_assist", "Brake Assist", YES_NO),
    select("is_power_door_locks", "Power Door Locks", YES_NO),
    select("is_central_locking", "Central Locking", YES_NO),
    select("is_power_steering", "Power Steering", YES_NO),
    select(
        "is_driver_seat_height_adjustable",
        "Driver Seat Height Adjustable",
        YES_NO,
    ),
    select(
        "is_day_night_rear_view_mirror",
        "Day/Night Rear View Mirror",
        YES_NO,
    ),
    select("is_ecw", "ECW (Engine Check Warning)", YES_NO),
    select("is_speed_alert", "Speed Alert", YES_NO),
];

/// Identifier column carried alongside the features
pub const ID_COLUMN: &str = "policy_id";

/// Prediction column of the submission file
pub const TARGET_COLUMN: &str = "is_claim";

/// Catalogue of the model's input fields.
///
/// Field order matches the form layout: numeric attributes first, then
/// categorical ones.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    /// Schema for the car insurance claim model (42 features).
    pub fn new() -> Self {
        let fields = NUMERIC_FIELDS
            .iter()
            .chain(CATEGORICAL_FIELDS.iter())
            .cloned()
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn numeric_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_numeric())
    }

    pub fn categorical_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_numeric())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get the number of features.
    pub fn feature_count(&self) -> usize {
        self.fields.len()
    }

    /// Get feature names in form order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new()
    }
}
