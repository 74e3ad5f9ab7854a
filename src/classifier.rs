//! Metro / Urban / Rural classification of registering offices.
//!
//! Official boundaries are not present in the extracts, so the classifier
//! looks for recognisable place names anywhere inside the free-text city,
//! district and office fields. Metro names are checked before Urban names;
//! within one table the longest matching name wins.
use crate::types::{RegionClass, VehicleRecord};
use once_cell::sync::Lazy;
use serde::Serialize;

const AUTHORITY: &str = "Census of India 2011";

/// Million-plus urban agglomerations.
const METRO_NAMES: &[&str] = &[
    "MUMBAI", "DELHI", "BANGALORE", "BENGALURU", "HYDERABAD", "AHMEDABAD",
    "CHENNAI", "KOLKATA", "PUNE", "SURAT", "JAIPUR", "LUCKNOW",
    "KANPUR", "NAGPUR", "INDORE", "THANE", "BHOPAL", "VISAKHAPATNAM",
    "PIMPRI-CHINCHWAD", "PATNA", "VADODARA", "GHAZIABAD", "LUDHIANA",
    "AGRA", "NASHIK", "FARIDABAD", "MEERUT", "RAJKOT", "KALYAN-DOMBIVALI",
    "VASAI-VIRAR", "VARANASI", "SRINAGAR", "AURANGABAD", "DHANBAD",
    "AMRITSAR", "NAVI MUMBAI", "ALLAHABAD", "PRAYAGRAJ", "HOWRAH",
    "RANCHI", "GWALIOR", "JABALPUR", "COIMBATORE", "VIJAYAWADA",
    "JODHPUR", "MADURAI", "RAIPUR", "KOTA", "CHANDIGARH",
];

/// Class I/II cities and urban agglomerations.
const URBAN_NAMES: &[&str] = &[
    "GUWAHATI", "CHANDIGARH", "THIRUVANANTHAPURAM", "SOLAPUR", "HUBLI-DHARWAD",
    "BAREILLY", "MORADABAD", "MYSORE", "GURGAON", "GURUGRAM", "ALIGARH",
    "JALANDHAR", "TIRUCHIRAPPALLI", "BHUBANESWAR", "SALEM", "WARANGAL",
    "MIRA-BHAYANDAR", "BHIWANDI", "SAHARANPUR",
    "GORAKHPUR", "BIKANER", "AMRAVATI", "NOIDA", "JAMSHEDPUR", "BHILAI",
    "CUTTACK", "FIROZABAD", "KOCHI", "ERNAKULAM", "BHAVNAGAR", "DEHRADUN",
    "DURGAPUR", "ASANSOL", "NANDED", "KOLHAPUR", "AJMER", "GULBARGA",
    "JAMNAGAR", "UJJAIN", "LONI", "SILIGURI", "JHANSI", "ULHASNAGAR",
    "JAMMU", "SANGLI-MIRAJ-KUPWAD", "MANGALORE", "ERODE", "BELGAUM",
    "AMBATTUR", "TIRUNELVELI", "MALEGAON", "GAYA", "JALGAON", "UDAIPUR",
];

/// Census 2011 thresholds for a census town.
pub const CENSUS_MIN_POPULATION: u64 = 5000;
pub const CENSUS_MIN_DENSITY_PER_SQ_KM: f64 = 400.0;
pub const CENSUS_MIN_NON_AGRI_WORKERS_PCT: f64 = 75.0;

// Longest names first; the stable sort keeps table order for equal lengths.
fn by_priority(names: &[&'static str]) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::with_capacity(names.len());
    for n in names {
        if !out.contains(n) {
            out.push(n);
        }
    }
    out.sort_by(|a, b| b.len().cmp(&a.len()));
    out
}

static METRO_PRIORITY: Lazy<Vec<&'static str>> = Lazy::new(|| by_priority(METRO_NAMES));
static URBAN_PRIORITY: Lazy<Vec<&'static str>> = Lazy::new(|| by_priority(URBAN_NAMES));

/// Which input field a rule matched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    City,
    District,
    Office,
}

/// Names the rule that produced a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleCitation {
    MetroName { name: &'static str, field: MatchedField },
    UrbanName { name: &'static str, field: MatchedField },
    Default,
}

impl std::fmt::Display for RuleCitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCitation::MetroName { name, field } => {
                write!(f, "metro name {} in {:?}", name, field)
            }
            RuleCitation::UrbanName { name, field } => {
                write!(f, "urban name {} in {:?}", name, field)
            }
            RuleCitation::Default => f.write_str("no name matched, default rural"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub class: RegionClass,
    pub tier: &'static str,
    pub definition: &'static str,
    pub authority: &'static str,
    pub citation: RuleCitation,
}

/// Classification attached to one office, as shown next to map markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficeInfo {
    pub office_code: String,
    pub office_name: String,
    pub city: String,
    pub district: String,
    pub state: String,
    pub class: RegionClass,
    pub tier: &'static str,
    pub definition_source: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionClassifier;

impl RegionClassifier {
    pub fn new() -> Self {
        RegionClassifier
    }

    /// Classify an office from its name and location strings. Never fails:
    /// no match means Rural. `state` does not take part in matching.
    pub fn classify(&self, office_name: &str, city: &str, district: &str, _state: &str) -> Classification {
        let fields = [
            (MatchedField::City, city.trim().to_uppercase()),
            (MatchedField::District, district.trim().to_uppercase()),
            (MatchedField::Office, office_name.trim().to_uppercase()),
        ];

        if let Some((name, field)) = find_match(&METRO_PRIORITY, &fields) {
            return Classification {
                class: RegionClass::Metro,
                tier: RegionClass::Metro.tier(),
                definition: "Million Plus Urban Agglomeration",
                authority: AUTHORITY,
                citation: RuleCitation::MetroName { name, field },
            };
        }
        if let Some((name, field)) = find_match(&URBAN_PRIORITY, &fields) {
            return Classification {
                class: RegionClass::Urban,
                tier: RegionClass::Urban.tier(),
                definition: "Class I/II City or Urban Agglomeration",
                authority: AUTHORITY,
                citation: RuleCitation::UrbanName { name, field },
            };
        }
        Classification {
            class: RegionClass::Rural,
            tier: RegionClass::Rural.tier(),
            definition: "Areas not classified as Urban by Census",
            authority: AUTHORITY,
            citation: RuleCitation::Default,
        }
    }

    pub fn classify_record(&self, record: &VehicleRecord) -> OfficeInfo {
        let c = self.classify(
            &record.office_name,
            &record.city_name,
            &record.district_name,
            &record.state_name,
        );
        OfficeInfo {
            office_code: record.office_code.clone(),
            office_name: record.office_name.clone(),
            city: record.city_name.clone(),
            district: record.district_name.clone(),
            state: record.state_name.clone(),
            class: c.class,
            tier: c.tier,
            definition_source: c.authority,
        }
    }

    pub fn available_classifications(&self) -> [RegionClass; 3] {
        RegionClass::ALL
    }
}

fn find_match(
    names: &[&'static str],
    fields: &[(MatchedField, String); 3],
) -> Option<(&'static str, MatchedField)> {
    for name in names {
        for (field, text) in fields {
            if text.contains(name) {
                return Some((name, *field));
            }
        }
    }
    None
}

/// Census 2011 urban test for a settlement with known statistics.
pub fn classify_by_census_definition(
    population: u64,
    density_per_sq_km: f64,
    non_agri_workers_pct: f64,
    has_municipality: bool,
) -> &'static str {
    if has_municipality {
        return "Urban (Statutory)";
    }
    if population >= CENSUS_MIN_POPULATION
        && density_per_sq_km >= CENSUS_MIN_DENSITY_PER_SQ_KM
        && non_agri_workers_pct >= CENSUS_MIN_NON_AGRI_WORKERS_PCT
    {
        return "Urban (Census)";
    }
    "Rural"
}
