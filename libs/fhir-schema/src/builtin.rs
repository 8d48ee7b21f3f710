//! Embedded schema definitions

pub(crate) const DEFINITIONS: &[(&str, &str)] = &[
    ("datatypes.json", include_str!("../definitions/datatypes.json")),
    ("appointment.json", include_str!("../definitions/appointment.json")),
    ("communication.json", include_str!("../definitions/communication.json")),
    ("device-request.json", include_str!("../definitions/device-request.json")),
];
