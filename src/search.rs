use crate::models::{DentistProfile, Directory};

pub const ALL_CITIES: &str = "All Cities";
pub const ALL_TREATMENTS: &str = "All Treatments";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Only(String),
}

impl Filter {
    /// Maps a button value back to a filter, treating the sentinel as `All`.
    pub fn parse(value: &str, sentinel: &str) -> Self {
        if value == sentinel {
            Filter::All
        } else {
            Filter::Only(value.to_string())
        }
    }

    pub fn label<'a>(&'a self, sentinel: &'a str) -> &'a str {
        match self {
            Filter::All => sentinel,
            Filter::Only(value) => value,
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// Case-insensitive substring filter over the directory, preserving its order.
pub fn filter_dentists<'a>(
    city: &Filter,
    treatment: &Filter,
    dentists: &'a [DentistProfile],
) -> Vec<&'a DentistProfile> {
    dentists
        .iter()
        .filter(|d| city.matches(&d.city))
        .filter(|d| match treatment {
            Filter::All => true,
            _ => d.treatments.iter().any(|t| treatment.matches(t)),
        })
        .collect()
}

#[derive(Debug, PartialEq)]
pub enum Listing<'a> {
    Unfiltered(Vec<&'a DentistProfile>),
    Matches(Vec<&'a DentistProfile>),
    NoMatches,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    pub city: Filter,
    pub treatment: Filter,
    applied: Option<Vec<i32>>,
}

impl SearchState {
    pub fn new() -> Self {
        SearchState {
            city: Filter::All,
            treatment: Filter::All,
            applied: None,
        }
    }

    pub fn set_city(&mut self, value: &str) {
        self.city = Filter::parse(value, ALL_CITIES);
    }

    pub fn set_treatment(&mut self, value: &str) {
        self.treatment = Filter::parse(value, ALL_TREATMENTS);
    }

    pub fn run(&mut self, directory: &Directory) {
        let ids: Vec<i32> = filter_dentists(&self.city, &self.treatment, directory.all())
            .iter()
            .map(|d| d.id)
            .collect();
        debug!("Search city={:?} treatment={:?} -> {:?}", self.city, self.treatment, ids);
        self.applied = Some(ids);
    }

    pub fn clear(&mut self) {
        *self = SearchState::new();
    }

    pub fn listing<'a>(&self, directory: &'a Directory) -> Listing<'a> {
        match &self.applied {
            None => Listing::Unfiltered(directory.all().iter().collect()),
            Some(ids) if ids.is_empty() => Listing::NoMatches,
            Some(ids) => Listing::Matches(
                directory
                    .all()
                    .iter()
                    .filter(|d| ids.contains(&d.id))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&DentistProfile]) -> Vec<String> {
        list.iter().map(|d| d.name.clone()).collect()
    }

    #[test]
    fn sentinels_return_full_directory() {
        let directory = Directory::reference();
        let city = Filter::parse(ALL_CITIES, ALL_CITIES);
        let treatment = Filter::parse(ALL_TREATMENTS, ALL_TREATMENTS);
        let result = filter_dentists(&city, &treatment, directory.all());
        let all: Vec<&DentistProfile> = directory.all().iter().collect();
        assert_eq!(result, all);
    }

    #[test]
    fn city_match_is_case_insensitive_substring() {
        let directory = Directory::reference();
        for needle in ["london", "Lond", "LONDON"] {
            let result = filter_dentists(&Filter::Only(needle.into()), &Filter::All, directory.all());
            assert_eq!(names(&result), vec!["Dr. Sarah Lee", "Dr. Michael Chen"]);
        }
    }

    #[test]
    fn manchester_with_all_treatments() {
        let directory = Directory::reference();
        let city = Filter::parse("Manchester", ALL_CITIES);
        let treatment = Filter::parse(ALL_TREATMENTS, ALL_TREATMENTS);
        let result = filter_dentists(&city, &treatment, directory.all());
        assert_eq!(names(&result), vec!["Dr. James Patel"]);
    }

    #[test]
    fn invisalign_in_all_cities() {
        let directory = Directory::reference();
        let city = Filter::parse(ALL_CITIES, ALL_CITIES);
        let treatment = Filter::parse("Invisalign", ALL_TREATMENTS);
        let result = filter_dentists(&city, &treatment, directory.all());
        assert_eq!(names(&result), vec!["Dr. Michael Chen"]);
    }

    #[test]
    fn results_are_ordered_subsequences() {
        let directory = Directory::reference();
        let mut cities: Vec<Filter> = directory.cities().into_iter().map(Filter::Only).collect();
        cities.push(Filter::All);
        cities.push(Filter::Only("nowhere".into()));
        let mut treatments: Vec<Filter> = directory.treatments().into_iter().map(Filter::Only).collect();
        treatments.push(Filter::All);
        treatments.push(Filter::Only("check".into()));

        for city in &cities {
            for treatment in &treatments {
                let result = filter_dentists(city, treatment, directory.all());
                let positions: Vec<usize> = result
                    .iter()
                    .map(|r| directory.all().iter().position(|d| d.id == r.id).unwrap())
                    .collect();
                assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn empty_result_is_distinct_from_unfiltered() {
        let directory = Directory::reference();
        let mut state = SearchState::new();
        assert!(matches!(state.listing(&directory), Listing::Unfiltered(ref all) if all.len() == 5));

        state.set_city("Bristol");
        state.set_treatment("Invisalign");
        state.run(&directory);
        assert_eq!(state.listing(&directory), Listing::NoMatches);

        state.clear();
        assert_eq!(state.city, Filter::All);
        assert_eq!(state.treatment, Filter::All);
        assert!(matches!(state.listing(&directory), Listing::Unfiltered(_)));
    }

    #[test]
    fn choosing_a_filter_does_not_rerun_search() {
        let directory = Directory::reference();
        let mut state = SearchState::new();
        state.set_city("Bristol");
        state.run(&directory);
        state.set_city("London");
        match state.listing(&directory) {
            Listing::Matches(found) => assert_eq!(names(&found), vec!["Dr. Maria Gomez"]),
            other => panic!("unexpected listing {:?}", other),
        }
    }
}
