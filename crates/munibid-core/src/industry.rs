//! Industry classification for records whose source did not supply one.
//! First-match over an ordered keyword table; order is part of the
//! contract and must not be reshuffled.

pub const OTHER: &str = "Other";

pub struct IndustryRule {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered primary rules. Evaluated against the lower-cased concatenation
/// of title and department; the first rule with any keyword hit wins.
pub const RULES: &[IndustryRule] = &[
    IndustryRule {
        label: "Water and Sewer Infrastructure",
        keywords: &[
            "water main",
            "sewer",
            "stormwater",
            "storm drain",
            "drainage",
            "hydrant",
            "pump station",
            "wastewater",
        ],
    },
    IndustryRule {
        label: "Energy and Electrical Services",
        keywords: &["electrical", "generator", "solar", "streetlight", "street light", "lighting"],
    },
    IndustryRule {
        label: "Construction (Buildings)",
        keywords: &["building", "renovation", "roof", "masonry", "window replacement", "flooring", "abatement"],
    },
    IndustryRule {
        label: "Construction (Public Works, Parks, Roadways)",
        keywords: &["paving", "roadway", "sidewalk", "bridge", "playground", "guardrail", "crosswalk", "resurfacing"],
    },
    IndustryRule {
        label: "Landscaping and Grounds",
        keywords: &["landscaping", "mowing", "tree", "grounds maintenance", "irrigation", "turf"],
    },
    IndustryRule {
        label: "Vehicle Maintenance and Parts",
        keywords: &["vehicle", "truck", "fleet", "ford", "chevrolet", "mower", "plow", "suv"],
    },
    IndustryRule {
        label: "IT - Software and Services",
        keywords: &["software", "technology", "network", "computer", "telecommunication", "broadband", "cybersecurity"],
    },
    IndustryRule {
        label: "Public Safety and Security",
        keywords: &["security", "surveillance", "body camera", "fire alarm", "radio system", "guard"],
    },
    IndustryRule {
        label: "Waste and Recycling",
        keywords: &["waste", "trash", "recycling", "refuse", "compost", "disposal"],
    },
    IndustryRule {
        label: "Food Services",
        keywords: &["food", "catering", "meal", "cafeteria"],
    },
    IndustryRule {
        label: "Design and Engineering",
        keywords: &["design", "engineering", "architect", "survey", "feasibility", "owner's project manager"],
    },
    IndustryRule {
        label: "Professional Services",
        keywords: &["consulting", "consultant", "legal", "audit", "actuarial", "insurance", "banking"],
    },
];

const PUBLIC_WORKS_MARKERS: [&str; 2] = ["dpw", "public works"];
const ENERGY_HINTS: [&str; 5] = ["boiler", "hvac", "furnace", "heating", "electrical"];
const WATER_HINTS: [&str; 3] = ["sewer", "water", "drain"];

/// True when the classifier should run: industry absent, empty, or the
/// "Other" sentinel. Anything else was supplied by the source and is
/// left alone.
pub fn needs_classification(existing: Option<&str>) -> bool {
    match existing {
        None => true,
        Some(value) => {
            let value = value.trim();
            value.is_empty() || value.eq_ignore_ascii_case(OTHER)
        }
    }
}

/// Classify one record from its title and department text.
pub fn classify(title: &str, department: Option<&str>) -> &'static str {
    let mut haystack = title.to_ascii_lowercase();
    if let Some(department) = department {
        haystack.push(' ');
        haystack.push_str(&department.to_ascii_lowercase());
    }

    for rule in RULES {
        if rule.keywords.iter().any(|keyword| haystack.contains(keyword)) {
            return rule.label;
        }
    }

    // Public-works departments get a trade-specific second pass before the
    // catch-all construction label.
    if PUBLIC_WORKS_MARKERS.iter().any(|marker| haystack.contains(marker)) {
        if ENERGY_HINTS.iter().any(|hint| haystack.contains(hint)) {
            return "Energy and Electrical Services";
        }
        if WATER_HINTS.iter().any(|hint| haystack.contains(hint)) {
            return "Water and Sewer Infrastructure";
        }
        return "Construction (Public Works, Parks, Roadways)";
    }

    OTHER
}
