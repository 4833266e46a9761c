//! Static organization directory rendered as globe markers.

use bevy::prelude::*;

/// One organization pinned to the globe. Never mutated after load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRecord {
    pub name: &'static str,
    pub city: &'static str,
    pub country: &'static str,
    pub lat: f32,
    pub lon: f32,
    pub leader_name: &'static str,
    pub phone: &'static str,
    pub address: &'static str,
    /// 0..=100, drives the marker bar height.
    pub influence_score: u8,
}

impl LocationRecord {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        name: &'static str,
        city: &'static str,
        country: &'static str,
        lat: f32,
        lon: f32,
        leader_name: &'static str,
        phone: &'static str,
        address: &'static str,
        influence_score: u8,
    ) -> Self {
        Self {
            name,
            city,
            country,
            lat,
            lon,
            leader_name,
            phone,
            address,
            influence_score,
        }
    }

    /// `"City, Country"` line used by the HUD card and directory.
    pub fn place(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

/// Record that fans out connections while the alternate mode is active.
pub const ALTERNATE_HUB: usize = 17;

pub static LOCATIONS: &[LocationRecord] = &[
    LocationRecord::new(
        "Board for Certification of Genealogists",
        "Washington, D.C.",
        "USA",
        38.9072,
        -77.0369,
        "President",
        "+1 202-555-0101",
        "PO Box 14291, Washington, DC",
        45,
    ),
    LocationRecord::new(
        "U.S. Department of Commerce",
        "Washington, D.C.",
        "USA",
        38.8899,
        -77.0260,
        "Sec. Gina Raimondo",
        "+1 202-482-2000",
        "1401 Constitution Ave NW",
        82,
    ),
    LocationRecord::new(
        "Australian Government",
        "Canberra",
        "Australia",
        -35.2809,
        149.1300,
        "PM Anthony Albanese",
        "+61 2 6277 7700",
        "Parliament House, Canberra",
        65,
    ),
    LocationRecord::new(
        "Eureka Network",
        "Brussels",
        "Belgium",
        50.8503,
        4.3517,
        "Head of Secretariat",
        "+32 2 777 09 50",
        "Avenue de Tervueren 2",
        55,
    ),
    LocationRecord::new(
        "European Commission",
        "Brussels",
        "Belgium",
        50.8427,
        4.3826,
        "Ursula von der Leyen",
        "+32 2 299 11 11",
        "Rue de la Loi 200",
        90,
    ),
    LocationRecord::new(
        "Council of the European Union",
        "Brussels",
        "Belgium",
        50.8415,
        4.3813,
        "Charles Michel",
        "+32 2 281 61 11",
        "Rue de la Loi 175",
        78,
    ),
    LocationRecord::new(
        "UNCTAD",
        "Geneva",
        "Switzerland",
        46.2044,
        6.1432,
        "Rebeca Grynspan",
        "+41 22 917 1234",
        "Palais des Nations",
        60,
    ),
    LocationRecord::new(
        "WTO",
        "Geneva",
        "Switzerland",
        46.2230,
        6.1462,
        "Ngozi Okonjo-Iweala",
        "+41 22 739 51 11",
        "Centre William Rappard",
        88,
    ),
    LocationRecord::new(
        "WHO",
        "Geneva",
        "Switzerland",
        46.2305,
        6.1367,
        "Dr. Tedros Adhanom",
        "+41 22 791 21 11",
        "Avenue Appia 20",
        95,
    ),
    LocationRecord::new(
        "Digitale Verwaltung Schweiz",
        "Bern",
        "Switzerland",
        46.9480,
        7.4474,
        "Peppino Giarritta",
        "+41 58 462 00 00",
        "Schwarztorstrasse 59",
        40,
    ),
    LocationRecord::new(
        "UN-Habitat",
        "Nairobi",
        "Kenya",
        -1.2921,
        36.8219,
        "Maimunah Mohd Sharif",
        "+254 20 762 1234",
        "United Nations Avenue",
        50,
    ),
    LocationRecord::new(
        "UNEP",
        "Nairobi",
        "Kenya",
        -1.2396,
        36.8170,
        "Inger Andersen",
        "+254 20 762 1234",
        "United Nations Avenue",
        52,
    ),
    LocationRecord::new(
        "UN Global Compact Germany",
        "Berlin",
        "Germany",
        52.5200,
        13.4050,
        "Marcel Engel",
        "+49 30 726 14 0",
        "Albrechtstraße 10 B",
        48,
    ),
    LocationRecord::new(
        "Deutscher Bundestag",
        "Berlin",
        "Germany",
        52.5186,
        13.3761,
        "Bärbel Bas",
        "+49 30 227 0",
        "Platz der Republik 1",
        75,
    ),
    LocationRecord::new(
        "UNICEF (HQ)",
        "New York City",
        "USA",
        40.7505,
        -73.9734,
        "Catherine Russell",
        "+1 212-326-7000",
        "3 United Nations Plaza",
        85,
    ),
    LocationRecord::new(
        "UN Global Compact",
        "New York City",
        "USA",
        40.7490,
        -73.9680,
        "Sanda Ojiambo",
        "+1 212-907-1301",
        "685 Third Avenue",
        70,
    ),
    LocationRecord::new(
        "Madison Square Garden Ent.",
        "New York City",
        "USA",
        40.7505,
        -73.9934,
        "James L. Dolan",
        "+1 212-465-6000",
        "4 Pennsylvania Plaza",
        62,
    ),
    LocationRecord::new(
        "IBM Corporation",
        "Armonk",
        "USA",
        41.1265,
        -73.7140,
        "Arvind Krishna",
        "+1 914-499-1900",
        "1 New Orchard Road",
        92,
    ),
    LocationRecord::new(
        "UNESCO",
        "Paris",
        "France",
        48.8566,
        2.3522,
        "Audrey Azoulay",
        "+33 1 45 68 10 00",
        "7 Place de Fontenoy",
        80,
    ),
    LocationRecord::new(
        "European Banking Authority",
        "Paris",
        "France",
        48.8926,
        2.2483,
        "José Manuel Campa",
        "+33 1 86 52 70 00",
        "20 Avenue André Prothin",
        68,
    ),
    LocationRecord::new(
        "CTBTO",
        "Vienna",
        "Austria",
        48.2082,
        16.3738,
        "Robert Floyd",
        "+43 1 26030 0",
        "Wagramer Str. 5",
        42,
    ),
    LocationRecord::new(
        "EUIPO",
        "Alicante",
        "Spain",
        38.3452,
        -0.4810,
        "João Negrão",
        "+34 965 13 91 00",
        "Avenida de Europa 4",
        58,
    ),
    LocationRecord::new(
        "FICPI",
        "Basel",
        "Switzerland",
        47.5596,
        7.5886,
        "President",
        "+41 61 271 65 00",
        "Nauenstrasse 73",
        35,
    ),
    LocationRecord::new(
        "Consejo General de la Abogacía",
        "Madrid",
        "Spain",
        40.4168,
        -3.7038,
        "Victoria Ortega",
        "+34 91 532 17 69",
        "Paseo de Recoletos 13",
        46,
    ),
    LocationRecord::new(
        "European Patent Office",
        "Munich",
        "Germany",
        48.1351,
        11.5820,
        "António Campinos",
        "+49 89 2399 0",
        "Bob-van-Benthem-Platz 1",
        72,
    ),
    LocationRecord::new(
        "European Investment Fund",
        "Luxembourg",
        "Luxembourg",
        49.6116,
        6.1319,
        "Marjut Falkstedt",
        "+352 2485 1",
        "37B Avenue J.F. Kennedy",
        66,
    ),
    LocationRecord::new(
        "St. Patrick’s Festival",
        "Dublin",
        "Ireland",
        53.3498,
        -6.2603,
        "Richard Tierney",
        "+353 1 604 0090",
        "Temple Bar",
        30,
    ),
    LocationRecord::new(
        "Basilica of National Shrine",
        "Washington, D.C.",
        "USA",
        38.9331,
        -77.0003,
        "Msgr. Walter Rossi",
        "+1 202-526-8300",
        "400 Michigan Ave NE",
        38,
    ),
    LocationRecord::new(
        "Frontegg",
        "Mountain View",
        "USA",
        37.3861,
        -122.0839,
        "Sagi Rodin",
        "+1 650-555-0123",
        "Mountain View, CA",
        76,
    ),
    LocationRecord::new(
        "Google",
        "Mountain View",
        "USA",
        37.4220,
        -122.0841,
        "Sundar Pichai",
        "+1 650-253-0000",
        "1600 Amphitheatre Pkwy",
        99,
    ),
    LocationRecord::new(
        "Auth0",
        "Bellevue",
        "USA",
        47.6101,
        -122.2015,
        "Eugenio Pace",
        "+1 425-555-0100",
        "10800 NE 8th St",
        84,
    ),
    LocationRecord::new(
        "Arm Ltd",
        "Cambridge",
        "UK",
        52.2053,
        0.1218,
        "Rene Haas",
        "+44 1223 400400",
        "110 Fulbourn Rd",
        86,
    ),
    LocationRecord::new(
        "OpenSSF",
        "San Francisco",
        "USA",
        37.7749,
        -122.4194,
        "Omkhar Arasaratnam",
        "+1 415-723-9709",
        "548 Market St",
        55,
    ),
    LocationRecord::new(
        "Linux Foundation",
        "San Francisco",
        "USA",
        37.7949,
        -122.4000,
        "Jim Zemlin",
        "+1 415-723-9709",
        "548 Market St",
        90,
    ),
    LocationRecord::new(
        "GitHub",
        "San Francisco",
        "USA",
        37.7820,
        -122.3940,
        "Thomas Dohmke",
        "+1 877-448-4820",
        "88 Colin P Kelly Jr St",
        94,
    ),
    LocationRecord::new(
        "AWS",
        "Seattle",
        "USA",
        47.6062,
        -122.3321,
        "Matt Garman",
        "+1 206-266-1000",
        "410 Terry Ave N",
        98,
    ),
    LocationRecord::new(
        "Microsoft",
        "Redmond",
        "USA",
        47.6740,
        -122.1215,
        "Satya Nadella",
        "+1 425-882-8080",
        "One Microsoft Way",
        97,
    ),
    LocationRecord::new(
        "Intel",
        "Santa Clara",
        "USA",
        37.3541,
        -121.9552,
        "Pat Gelsinger",
        "+1 408-765-8080",
        "2200 Mission College Blvd",
        91,
    ),
    LocationRecord::new(
        "NSF",
        "Alexandria",
        "USA",
        38.8048,
        -77.0469,
        "Sethuraman Panchanathan",
        "+1 703-292-5111",
        "2415 Eisenhower Ave",
        70,
    ),
    LocationRecord::new(
        "I-Corps Hub",
        "Princeton",
        "USA",
        40.3573,
        -74.6672,
        "Director",
        "+1 609-258-3000",
        "Princeton University",
        44,
    ),
    LocationRecord::new(
        "FINRA",
        "Washington, D.C.",
        "USA",
        38.9072,
        -77.0369,
        "Robert W. Cook",
        "+1 301-590-6500",
        "1735 K Street",
        64,
    ),
    LocationRecord::new(
        "500 Global",
        "San Francisco",
        "USA",
        37.7749,
        -122.4194,
        "Christine Tsai",
        "+1 415-555-0199",
        "814 Mission St",
        73,
    ),
    LocationRecord::new(
        "OpenAI",
        "San Francisco",
        "USA",
        37.7609,
        -122.4148,
        "Sam Altman",
        "+1 650-555-0100",
        "3180 18th St",
        96,
    ),
    LocationRecord::new(
        "WIPO",
        "Geneva",
        "Switzerland",
        46.2218,
        6.1394,
        "Daren Tang",
        "+41 22 338 91 11",
        "34, chemin des Colombettes",
        62,
    ),
    LocationRecord::new(
        "USPTO",
        "Alexandria",
        "USA",
        38.8048,
        -77.0469,
        "Kathi Vidal",
        "+1 800-786-9199",
        "600 Dulany St",
        81,
    ),
    LocationRecord::new(
        "European Parliament",
        "Strasbourg",
        "France",
        48.5734,
        7.7521,
        "Roberta Metsola",
        "+33 3 88 17 40 01",
        "Allée du Printemps",
        89,
    ),
    LocationRecord::new(
        "Microsoft for Startups",
        "Redmond",
        "USA",
        47.6740,
        -122.1215,
        "VP Startups",
        "+1 425-882-8080",
        "One Microsoft Way",
        77,
    ),
    LocationRecord::new(
        "AWS Activate",
        "Seattle",
        "USA",
        47.6062,
        -122.3321,
        "Global Head",
        "+1 206-266-1000",
        "410 Terry Ave N",
        79,
    ),
];

/// Currently selected record, by index into [`LOCATIONS`].
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection(pub Option<usize>);

impl Selection {
    pub fn record(&self) -> Option<&'static LocationRecord> {
        self.0.and_then(|index| LOCATIONS.get(index))
    }

    pub fn is(&self, index: usize) -> bool {
        self.0 == Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_is_complete() {
        assert_eq!(LOCATIONS.len(), 48);
        assert_eq!(LOCATIONS[ALTERNATE_HUB].name, "IBM Corporation");
    }

    #[test]
    fn records_are_plausible() {
        for record in LOCATIONS {
            assert!((-90.0..=90.0).contains(&record.lat), "{}", record.name);
            assert!((-180.0..=180.0).contains(&record.lon), "{}", record.name);
            assert!(record.influence_score <= 100, "{}", record.name);
        }
    }

    #[test]
    fn selection_resolves_records() {
        assert!(Selection::default().record().is_none());

        let selection = Selection(Some(0));
        assert!(selection.is(0));
        assert_eq!(selection.record().map(|r| r.city), Some("Washington, D.C."));
        assert!(Selection(Some(999)).record().is_none());
    }
}
