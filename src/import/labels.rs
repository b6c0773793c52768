//! Japanese source labels mapped to the canonical codes exposed by the API.
//!
//! Labels missing from a table fall back to the raw label itself.

use std::collections::HashMap;
use std::sync::LazyLock;

const STATIONS: [(&str, &str); 16] = [
    ("香椎", "kashii"),
    ("東", "higashi"),
    ("吉塚", "yoshizuka"),
    ("春吉", "haruyoshi"),
    ("南", "minami"),
    ("長尾", "nagao"),
    ("祖原", "sohara"),
    ("元岡", "motooka"),
    ("千鳥橋", "chidoriashi"),
    ("比恵", "hie"),
    ("天神", "tenjin"),
    ("大橋", "ohashi"),
    ("別府橋", "befubashi"),
    ("西新", "nishijin"),
    ("石丸", "ishimaru"),
    ("今宿", "imajuku"),
];

const MEASUREMENT_TYPES: [(&str, &str); 14] = [
    ("一酸化窒素", "no"),
    ("二酸化窒素", "no2"),
    ("窒素酸化物", "nox"),
    ("光化学オキシダント", "oxidant"),
    ("非メタン炭化水素", "nmhc"),
    ("メタン", "ch4"),
    ("全炭化水素", "thc"),
    ("浮遊粒子状物質", "spm"),
    ("微小粒子状物質(PM2.5)", "pm25"),
    ("風速", "wind_speed"),
    ("風向", "wind_dir"),
    ("二酸化硫黄", "so2"),
    ("一酸化炭素", "co"),
    ("日射量", "sunlight"),
];

const DAMS: [(&str, &str); 9] = [
    ("南畑ダム", "Minamihata"),
    ("五ケ山ダム", "Gokayama"),
    ("脊振ダム", "Seburi"),
    ("曲渕ダム", "Magaribuchi"),
    ("江川ダム", "Egawa"),
    ("久原ダム", "Kuhara"),
    ("長谷ダム", "Nagaya"),
    ("猪野ダム", "Ino"),
    ("瑞梅寺ダム", "Zuibaiji"),
];

static STATION_CODES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from(STATIONS));
static MEASUREMENT_TYPE_CODES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from(MEASUREMENT_TYPES));
static DAM_NAMES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from(DAMS));

#[must_use]
pub fn station_code(label: &str) -> &str {
    STATION_CODES.get(label).copied().unwrap_or(label)
}

#[must_use]
pub fn measurement_type_code(label: &str) -> &str {
    MEASUREMENT_TYPE_CODES.get(label).copied().unwrap_or(label)
}

#[must_use]
pub fn dam_english_name(label: &str) -> &str {
    DAM_NAMES.get(label).copied().unwrap_or(label)
}

/// Whether a CSV column names one of the known dams.
#[must_use]
pub fn is_known_dam(label: &str) -> bool {
    DAM_NAMES.contains_key(label)
}

#[must_use]
pub fn station_codes() -> Vec<&'static str> {
    STATIONS.iter().map(|(_, code)| *code).collect()
}

#[must_use]
pub fn measurement_type_codes() -> Vec<&'static str> {
    MEASUREMENT_TYPES.iter().map(|(_, code)| *code).collect()
}
