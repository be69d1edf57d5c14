//! Free course suggestions for commonly missing skills.

/// A course that teaches one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Course {
    pub title: &'static str,
    pub provider: &'static str,
}

const CATALOG: &[(&str, Course)] = &[
    ("Python", Course { title: "Programming, Data Structures and Algorithms using Python", provider: "NPTEL" }),
    ("JavaScript", Course { title: "JavaScript Algorithms and Data Structures", provider: "freeCodeCamp" }),
    ("React", Course { title: "Front End Development Libraries", provider: "freeCodeCamp" }),
    ("SQL", Course { title: "Data Base Management System", provider: "NPTEL" }),
    ("Machine Learning", Course { title: "Introduction to Machine Learning", provider: "NPTEL" }),
    ("Data Analysis", Course { title: "Data Analytics with Python", provider: "NPTEL" }),
    ("Excel", Course { title: "Spreadsheets for Business", provider: "SWAYAM" }),
    ("Communication", Course { title: "Developing Soft Skills and Personality", provider: "NPTEL" }),
    ("Java", Course { title: "Programming in Java", provider: "NPTEL" }),
    ("Digital Marketing", Course { title: "Digital Marketing", provider: "SWAYAM" }),
];

/// Find a course for a skill (case-insensitive).
pub fn course_for(skill: &str) -> Option<Course> {
    let wanted = skill.trim();
    CATALOG
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, course)| *course)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let course = course_for("python").unwrap();
        assert_eq!(course.provider, "NPTEL");
        assert!(course_for(" SQL ").is_some());
    }

    #[test]
    fn unknown_skill() {
        assert!(course_for("Underwater Basket Weaving").is_none());
    }
}
