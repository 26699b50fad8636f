//! Demo data loaded by the services when started with `--seed`.

use crate::auth::PasswordHasher;
use crate::common::error::Result;
use crate::domain::*;
use crate::storage::Storage;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use tracing::{info, warn};

pub const ADMIN_EMAIL: &str = "admin@admin.com";
pub const STUDENT_EMAIL: &str = "user@user.com";

pub const FRENCH: &str = "Français";
pub const MATHS: &str = "Mathématiques";
pub const ENGLISH: &str = "Anglais";

const SEED_COURSE_DAYS: i64 = 90;

/// Create the admin and student accounts when they are missing.
pub async fn seed_users(storage: &dyn Storage, hasher: &PasswordHasher) -> Result<()> {
    let accounts = [
        (ADMIN_EMAIL, "admin", "admin", Role::Admin),
        (STUDENT_EMAIL, "user", "user", Role::User),
    ];

    for (email, pseudo, password, role) in accounts {
        if storage.get_user_by_email(email).await?.is_some() {
            continue;
        }
        let hash = hasher.hash(password).await?;
        storage
            .create_user(&User::new(email, pseudo, hash, role))
            .await?;
        info!("Seeded user {}", email);
    }
    Ok(())
}

/// Create the three default courses taught by the admin and enroll the
/// student in each of them.
pub async fn seed_courses(storage: &dyn Storage, today: NaiveDate) -> Result<()> {
    let Some(admin) = storage.get_user_by_email(ADMIN_EMAIL).await? else {
        warn!("Skipping course seed: {} does not exist", ADMIN_EMAIL);
        return Ok(());
    };

    if storage.get_courses_by_professor(admin.id).await?.is_empty() {
        for name in [FRENCH, MATHS, ENGLISH] {
            let course = Course::new(
                name,
                admin.id,
                None,
                today,
                today + Duration::days(SEED_COURSE_DAYS),
                DEFAULT_COURSE_HOURS,
            );
            storage.create_course(&course).await?;
            info!("Seeded course {}", name);
        }
    }

    let Some(student) = storage.get_user_by_email(STUDENT_EMAIL).await? else {
        warn!("Skipping enrollment seed: {} does not exist", STUDENT_EMAIL);
        return Ok(());
    };
    for course in storage.get_courses_by_professor(admin.id).await? {
        if [FRENCH, MATHS, ENGLISH].contains(&course.name.as_str()) {
            storage.enroll_student(course.id, student.id).await?;
        }
    }
    Ok(())
}

/// Give the student one French and four English grades, unless they
/// already have grades.
pub async fn seed_grades<R: Rng + Send>(storage: &dyn Storage, rng: &mut R) -> Result<()> {
    let Some(student) = storage.get_user_by_email(STUDENT_EMAIL).await? else {
        warn!("Skipping grade seed: {} does not exist", STUDENT_EMAIL);
        return Ok(());
    };
    if !storage.get_grades_by_student(student.id).await?.is_empty() {
        info!("Student already has grades");
        return Ok(());
    }

    let courses = storage.get_all_courses().await?;
    let find = |name: &str| courses.iter().find(|c| c.name == name).map(|c| c.id);
    let (Some(french), Some(english)) = (find(FRENCH), find(ENGLISH)) else {
        warn!("Skipping grade seed: default courses do not exist");
        return Ok(());
    };

    let plan = std::iter::once(french).chain(std::iter::repeat(english).take(4));
    for course_id in plan {
        let note = random_note(rng);
        let grade = Grade::new(student.id, course_id, note, Some(comment_for(note).to_string()));
        storage.create_grade(&grade).await?;
    }
    info!("Default grades created");
    Ok(())
}

/// A note between 0 and 20 in steps of 0.25.
pub fn random_note<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.gen_range(0..=80u32)) * 0.25
}

pub fn comment_for(note: f64) -> &'static str {
    if note < 5.0 {
        "Travail insuffisant"
    } else if note < 10.0 {
        "Peut mieux faire"
    } else if note < 15.0 {
        "Bon effort"
    } else if note < 18.0 {
        "Très bon travail"
    } else {
        "Excellent !"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn test_comment_bands() {
        assert_eq!(comment_for(4.75), "Travail insuffisant");
        assert_eq!(comment_for(5.0), "Peut mieux faire");
        assert_eq!(comment_for(14.75), "Bon effort");
        assert_eq!(comment_for(15.0), "Très bon travail");
        assert_eq!(comment_for(18.0), "Excellent !");
    }

    #[test]
    fn test_random_note_steps() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let note = random_note(&mut rng);
            assert!((0.0..=20.0).contains(&note));
            assert_eq!((note * 4.0).fract(), 0.0);
        }
    }

    #[tokio::test]
    async fn test_full_seed_is_idempotent() {
        let storage = InMemoryStorage::new();
        let hasher = PasswordHasher::new(4);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..2 {
            seed_users(&storage, &hasher).await.unwrap();
            seed_courses(&storage, today()).await.unwrap();
            seed_grades(&storage, &mut rng).await.unwrap();
        }

        assert_eq!(storage.get_all_users().await.unwrap().len(), 2);
        assert_eq!(storage.get_all_courses().await.unwrap().len(), 3);

        let student = storage.get_user_by_email(STUDENT_EMAIL).await.unwrap().unwrap();
        assert_eq!(storage.get_enrolled_courses(student.id).await.unwrap().len(), 3);

        let grades = storage.get_grades_by_student(student.id).await.unwrap();
        assert_eq!(grades.len(), 5);
        for grade in grades {
            assert_eq!(grade.comment.as_deref(), Some(comment_for(grade.note)));
        }
    }

    #[tokio::test]
    async fn test_courses_skip_without_admin() {
        let storage = InMemoryStorage::new();
        seed_courses(&storage, today()).await.unwrap();
        assert!(storage.get_all_courses().await.unwrap().is_empty());
    }
}
