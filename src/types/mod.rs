use serde::{Deserialize, Serialize};

/// MAV_CMD_NAV_WAYPOINT (x=lat, y=lon, z=alt)
pub const CMD_WAYPOINT: u16 = 16;
/// MAV_CMD_CONDITION_DISTANCE (param1 = trigger distance in meters)
pub const CMD_CONDITION_DISTANCE: u16 = 114;
/// MAV_CMD_CONDITION_YAW (param1 = target heading in degrees)
pub const CMD_CONDITION_YAW: u16 = 115;
/// MAV_CMD_DO_SEND_SCRIPT_MESSAGE
pub const CMD_DO_SEND_SCRIPT_MESSAGE: u16 = 217;

/// Script message id (param1) reserved for spray control
pub const SPRAY_CONTROL_MESSAGE: f64 = 2.0;

/// One mission plan entry, in QGC WPL column order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub seq: u32,
    pub current: u8,
    pub frame: u8,
    pub command: u16,
    pub param1: f64,
    pub param2: f64,
    pub param3: f64,
    pub param4: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub autocontinue: u8,
}

impl CommandRecord {
    /// Blank record for `command`: frame 0, autocontinue set, all params zero.
    pub fn new(command: u16) -> Self {
        Self {
            seq: 0,
            current: 0,
            frame: 0,
            command,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            autocontinue: 1,
        }
    }

    pub fn waypoint(lat: f64, lon: f64, alt: f64) -> Self {
        Self {
            frame: 3,
            x: lat,
            y: lon,
            z: alt,
            ..Self::new(CMD_WAYPOINT)
        }
    }

    pub fn condition_yaw(heading_deg: f64) -> Self {
        Self {
            param1: heading_deg,
            ..Self::new(CMD_CONDITION_YAW)
        }
    }

    pub fn condition_distance(distance_m: f64) -> Self {
        Self {
            param1: distance_m,
            ..Self::new(CMD_CONDITION_DISTANCE)
        }
    }

    /// Spray control message; `code == 0` switches the sprayer off.
    pub fn spray(code: u32) -> Self {
        Self {
            param1: SPRAY_CONTROL_MESSAGE,
            param2: code as f64,
            ..Self::new(CMD_DO_SEND_SCRIPT_MESSAGE)
        }
    }

    pub fn is_waypoint(&self) -> bool {
        self.command == CMD_WAYPOINT
    }

    pub fn is_condition_distance(&self) -> bool {
        self.command == CMD_CONDITION_DISTANCE
    }

    pub fn is_condition_yaw(&self) -> bool {
        self.command == CMD_CONDITION_YAW
    }

    fn is_spray_control(&self) -> bool {
        self.command == CMD_DO_SEND_SCRIPT_MESSAGE && self.param1 == SPRAY_CONTROL_MESSAGE
    }

    /// Spray switched on, `param2` carries the nozzle code.
    pub fn is_spray_activation(&self) -> bool {
        self.is_spray_control() && self.param2 != 0.0
    }

    pub fn is_spray_deactivation(&self) -> bool {
        self.is_spray_control() && self.param2 == 0.0
    }

    /// Nozzle code carried by an activation record.
    ///
    /// `None` unless param2 is a whole number in `1..=u32::MAX`; negative,
    /// fractional or NaN values are not nozzle codes.
    pub fn actuator_code(&self) -> Option<ActuatorCode> {
        let raw = self.param2;
        if self.is_spray_activation()
            && raw.fract() == 0.0
            && (1.0..=u32::MAX as f64).contains(&raw)
        {
            Some(ActuatorCode(raw as u32))
        } else {
            None
        }
    }
}

/// Nozzle selection bit field.
///
/// Bits [0:1] drive one nozzle pair, bits [2:3] the other. Front and back are
/// the same pattern with the two pairs swapped; bits above 3 are passed through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorCode(pub u32);

impl ActuatorCode {
    /// Both nozzle sets in the back
    pub const BACK: ActuatorCode = ActuatorCode(0x3);
    /// Both nozzle sets in the front
    pub const FRONT: ActuatorCode = ActuatorCode(0xC);

    /// Swap the low and high nozzle pairs (front <-> back).
    pub fn swapped(self) -> Self {
        let code = self.0;
        ActuatorCode(((code & 0x3) << 2) | ((code & 0xC) >> 2) | (code & !0xF))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ActuatorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered list of mission records.
///
/// Annotators never reorder or delete records: they either overwrite fields of
/// an existing record or build a fresh plan by appending.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionPlan {
    records: Vec<CommandRecord>,
}

impl MissionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: CommandRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CommandRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CommandRecord> {
        self.records.get_mut(index)
    }

    pub fn records(&self) -> &[CommandRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandRecord> {
        self.records.iter()
    }

    /// Rewrite `seq` so it matches the output position.
    pub fn renumber(&mut self) {
        for (index, record) in self.records.iter_mut().enumerate() {
            record.seq = index as u32;
        }
    }

    pub fn count_command(&self, command: u16) -> usize {
        self.records.iter().filter(|r| r.command == command).count()
    }
}

impl From<Vec<CommandRecord>> for MissionPlan {
    fn from(records: Vec<CommandRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<CommandRecord> for MissionPlan {
    fn from_iter<I: IntoIterator<Item = CommandRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MissionPlan {
    type Item = &'a CommandRecord;
    type IntoIter = std::slice::Iter<'a, CommandRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_front_back() {
        assert_eq!(ActuatorCode::BACK.swapped(), ActuatorCode::FRONT);
        assert_eq!(ActuatorCode::FRONT.swapped(), ActuatorCode::BACK);
        // one nozzle per pair: 0b0110 -> 0b1001
        assert_eq!(ActuatorCode(6).swapped(), ActuatorCode(9));
    }

    #[test]
    fn test_swap_is_involution() {
        for code in 0..16u32 {
            let c = ActuatorCode(code);
            assert_eq!(c.swapped().swapped(), c);
        }
    }

    #[test]
    fn test_swap_keeps_upper_bits() {
        assert_eq!(ActuatorCode(0x13).swapped(), ActuatorCode(0x1C));
    }

    #[test]
    fn test_spray_classification() {
        let on = CommandRecord::spray(3);
        let off = CommandRecord::spray(0);
        assert!(on.is_spray_activation());
        assert!(!on.is_spray_deactivation());
        assert!(off.is_spray_deactivation());
        assert_eq!(on.actuator_code(), Some(ActuatorCode::BACK));
        assert_eq!(off.actuator_code(), None);

        // other script messages are not spray control
        let mut other = CommandRecord::spray(3);
        other.param1 = 1.0;
        assert!(!other.is_spray_activation());
        assert!(!other.is_spray_deactivation());
    }

    #[test]
    fn test_actuator_code_rejects_non_codes() {
        for raw in [-3.0, 0.5, -0.5, 2.5, f64::NAN, 1e12] {
            let mut record = CommandRecord::spray(3);
            record.param2 = raw;
            assert!(record.is_spray_activation(), "param2 {}", raw);
            assert_eq!(record.actuator_code(), None, "param2 {}", raw);
        }

        let mut record = CommandRecord::spray(0);
        record.param2 = 12.0;
        assert_eq!(record.actuator_code(), Some(ActuatorCode::FRONT));
    }

    #[test]
    fn test_renumber() {
        let mut plan: MissionPlan = vec![
            CommandRecord::waypoint(47.0, 8.0, 10.0),
            CommandRecord::condition_distance(6.0),
            CommandRecord::spray(0),
        ]
        .into();
        plan.renumber();
        let seqs: Vec<u32> = plan.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(plan.count_command(CMD_CONDITION_DISTANCE), 1);
    }
}
