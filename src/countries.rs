//! Country display name to ISO-3166 alpha-3 code lookup for choropleth maps

/// Known names and aliases, lower-case
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("argentina", "ARG"),
    ("australia", "AUS"),
    ("austria", "AUT"),
    ("belgium", "BEL"),
    ("brazil", "BRA"),
    ("bulgaria", "BGR"),
    ("canada", "CAN"),
    ("chile", "CHL"),
    ("china", "CHN"),
    ("colombia", "COL"),
    ("croatia", "HRV"),
    ("czech republic", "CZE"),
    ("czechia", "CZE"),
    ("denmark", "DNK"),
    ("egypt", "EGY"),
    ("estonia", "EST"),
    ("finland", "FIN"),
    ("france", "FRA"),
    ("germany", "DEU"),
    ("greece", "GRC"),
    ("hong kong", "HKG"),
    ("hungary", "HUN"),
    ("iceland", "ISL"),
    ("india", "IND"),
    ("indonesia", "IDN"),
    ("ireland", "IRL"),
    ("israel", "ISR"),
    ("italy", "ITA"),
    ("japan", "JPN"),
    ("kenya", "KEN"),
    ("latvia", "LVA"),
    ("lithuania", "LTU"),
    ("luxembourg", "LUX"),
    ("malaysia", "MYS"),
    ("mexico", "MEX"),
    ("morocco", "MAR"),
    ("netherlands", "NLD"),
    ("the netherlands", "NLD"),
    ("new zealand", "NZL"),
    ("nigeria", "NGA"),
    ("norway", "NOR"),
    ("peru", "PER"),
    ("philippines", "PHL"),
    ("poland", "POL"),
    ("portugal", "PRT"),
    ("romania", "ROU"),
    ("russia", "RUS"),
    ("russian federation", "RUS"),
    ("saudi arabia", "SAU"),
    ("serbia", "SRB"),
    ("singapore", "SGP"),
    ("slovakia", "SVK"),
    ("slovenia", "SVN"),
    ("south africa", "ZAF"),
    ("south korea", "KOR"),
    ("korea, republic of", "KOR"),
    ("spain", "ESP"),
    ("sweden", "SWE"),
    ("switzerland", "CHE"),
    ("taiwan", "TWN"),
    ("thailand", "THA"),
    ("turkey", "TUR"),
    ("türkiye", "TUR"),
    ("ukraine", "UKR"),
    ("united arab emirates", "ARE"),
    ("uae", "ARE"),
    ("united kingdom", "GBR"),
    ("uk", "GBR"),
    ("great britain", "GBR"),
    ("united states", "USA"),
    ("united states of america", "USA"),
    ("usa", "USA"),
    ("us", "USA"),
    ("uruguay", "URY"),
    ("vietnam", "VNM"),
    ("viet nam", "VNM"),
];

/// Resolve a country display name, case-insensitively.
/// Three-letter codes already in the table resolve to themselves.
pub fn iso3_code(name: &str) -> Option<&'static str> {
    let key = name.trim().to_lowercase();
    COUNTRY_CODES
        .iter()
        .find(|(alias, code)| *alias == key || code.eq_ignore_ascii_case(&key))
        .map(|(_, code)| *code)
}
