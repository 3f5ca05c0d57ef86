#[derive(Debug, Clone, PartialEq)]
pub struct DentistProfile {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub headline: String,
    pub bio: String,
    pub treatments: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub experience_years: Option<u8>,
    pub education: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Patient,
    Provider,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Provider => "dentist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub email: String,
    pub role: Role,
}

pub const OFFICE_HOURS: [(&str, &str); 3] = [
    ("Monday - Friday", "9:00 AM - 6:00 PM"),
    ("Saturday", "9:00 AM - 2:00 PM"),
    ("Sunday", "Closed"),
];

// Treatments a new provider can pick from during registration.
pub const TREATMENT_CATALOGUE: [&str; 11] = [
    "Check-up",
    "Cleaning",
    "Fillings",
    "Root Canal",
    "Teeth Whitening",
    "Braces",
    "Invisalign",
    "Implants",
    "Oral Surgery",
    "Pediatric Dentistry",
    "Retainers",
];

/// Immutable, in-memory list of dentists the bot searches over.
#[derive(Debug, Clone)]
pub struct Directory {
    dentists: Vec<DentistProfile>,
}

impl Directory {
    pub fn new(dentists: Vec<DentistProfile>) -> Self {
        Directory { dentists }
    }

    pub fn all(&self) -> &[DentistProfile] {
        &self.dentists
    }

    pub fn find(&self, id: i32) -> Option<&DentistProfile> {
        self.dentists.iter().find(|d| d.id == id)
    }

    /// Distinct cities in first-seen order.
    pub fn cities(&self) -> Vec<String> {
        let mut cities: Vec<String> = Vec::new();
        for d in &self.dentists {
            if !cities.contains(&d.city) {
                cities.push(d.city.clone());
            }
        }
        cities
    }

    /// Distinct treatments in first-seen order.
    pub fn treatments(&self) -> Vec<String> {
        let mut treatments: Vec<String> = Vec::new();
        for t in self.dentists.iter().flat_map(|d| d.treatments.iter()) {
            if !treatments.contains(t) {
                treatments.push(t.clone());
            }
        }
        treatments
    }

    pub fn reference() -> Self {
        Directory::new(vec![
            dentist(
                1,
                "Dr. Sarah Lee",
                "London",
                "Expert in cosmetic and pediatric dentistry.",
                "Expert in cosmetic and pediatric dentistry with over 12 years of experience. Dr. Lee is passionate about creating beautiful smiles while ensuring patient comfort. She specializes in advanced cosmetic procedures and has a gentle approach that makes her especially popular with children and anxious patients.",
                &["Teeth Whitening", "Braces", "Pediatric Dentistry"],
                ("+44 20 7123 4567", "sarah.lee@dentalconnect.com", 12, "King's College London Dental Institute"),
            ),
            dentist(
                2,
                "Dr. James Patel",
                "Manchester",
                "General practitioner with 15 years of experience.",
                "General practitioner with 15 years of experience in comprehensive dental care. Dr. Patel believes in preventive dentistry and takes time to educate patients about oral health. His calm demeanor and thorough approach have earned him a loyal patient base throughout Manchester.",
                &["Check-up", "Fillings", "Root Canal"],
                ("+44 161 234 5678", "james.patel@dentalconnect.com", 15, "University of Manchester School of Dentistry"),
            ),
            dentist(
                3,
                "Dr. Maria Gomez",
                "Bristol",
                "Specializes in implants and oral surgery.",
                "Specializes in implants and oral surgery with advanced training in complex dental procedures. Dr. Gomez combines cutting-edge technology with compassionate care to deliver exceptional results. She is known for her precision in surgical procedures and commitment to patient comfort.",
                &["Implants", "Oral Surgery", "Check-up"],
                ("+44 117 345 6789", "maria.gomez@dentalconnect.com", 10, "University of Bristol Dental School"),
            ),
            dentist(
                4,
                "Dr. Michael Chen",
                "London",
                "Orthodontist specializing in modern alignment solutions.",
                "Orthodontist specializing in modern alignment solutions including traditional braces and clear aligners. Dr. Chen stays at the forefront of orthodontic technology to provide the most effective and comfortable treatment options for patients of all ages.",
                &["Braces", "Invisalign", "Retainers"],
                ("+44 20 8765 4321", "michael.chen@dentalconnect.com", 8, "Queen Mary University of London"),
            ),
            dentist(
                5,
                "Dr. Emma Wilson",
                "Birmingham",
                "Preventive dentistry and family dental care specialist.",
                "Preventive dentistry and family dental care specialist focused on maintaining optimal oral health for patients of all ages. Dr. Wilson creates a welcoming environment for families and emphasizes the importance of regular dental care and education.",
                &["Check-up", "Cleaning", "Pediatric Dentistry"],
                ("+44 121 456 7890", "emma.wilson@dentalconnect.com", 14, "University of Birmingham School of Dentistry"),
            ),
        ])
    }
}

fn dentist(
    id: i32,
    name: &str,
    city: &str,
    headline: &str,
    bio: &str,
    treatments: &[&str],
    contact: (&str, &str, u8, &str),
) -> DentistProfile {
    let (phone, email, experience_years, education) = contact;
    DentistProfile {
        id,
        name: name.to_string(),
        city: city.to_string(),
        headline: headline.to_string(),
        bio: bio.to_string(),
        treatments: treatments.iter().map(|t| t.to_string()).collect(),
        phone: Some(phone.to_string()),
        email: Some(email.to_string()),
        experience_years: Some(experience_years),
        education: Some(education.to_string()),
    }
}

/// What the profile view shows for a requested id.
#[derive(Debug, PartialEq)]
pub enum ProfileView<'a> {
    Found(&'a DentistProfile),
    NotFound,
}

impl<'a> ProfileView<'a> {
    pub fn resolve(directory: &'a Directory, id: i32) -> Self {
        match directory.find(id) {
            Some(dentist) => ProfileView::Found(dentist),
            None => ProfileView::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_ids_are_unique() {
        let directory = Directory::reference();
        let mut ids: Vec<i32> = directory.all().iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), directory.all().len());
    }

    #[test]
    fn lookup_returns_exact_profile() {
        let directory = Directory::reference();
        match ProfileView::resolve(&directory, 1) {
            ProfileView::Found(d) => {
                assert_eq!(d.name, "Dr. Sarah Lee");
                assert_eq!(d.city, "London");
                assert_eq!(d.phone.as_deref(), Some("+44 20 7123 4567"));
                assert_eq!(d.experience_years, Some(12));
                assert_eq!(d, &directory.all()[0]);
            }
            ProfileView::NotFound => panic!("dentist 1 should exist"),
        }
    }

    #[test]
    fn unknown_id_is_not_found() {
        let directory = Directory::reference();
        assert_eq!(ProfileView::resolve(&directory, 999), ProfileView::NotFound);
    }

    #[test]
    fn option_lists_are_deduplicated_in_order() {
        let directory = Directory::reference();
        assert_eq!(directory.cities(), vec!["London", "Manchester", "Bristol", "Birmingham"]);

        let treatments = directory.treatments();
        assert_eq!(treatments.first().map(String::as_str), Some("Teeth Whitening"));
        assert_eq!(treatments.iter().filter(|t| t.as_str() == "Check-up").count(), 1);
        assert_eq!(treatments.len(), 11);
    }
}
