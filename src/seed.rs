//! Demo data for the in-process repository.
//!
//! The binary starts from this set so every route has something to return
//! without a database.

use serde_json::{json, Value};

use crate::search::{InMemoryRepository, Resource, Row};

/// Builds a repository holding a small alumni network.
pub fn demo_repository() -> InMemoryRepository {
    InMemoryRepository::with_rows([
        (Resource::Alumni, rows(alumni())),
        (Resource::Events, rows(events())),
        (Resource::ForumPosts, rows(forum_posts())),
        (Resource::Registrations, rows(registrations())),
    ])
}

fn rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn alumni() -> Value {
    json!([
        {
            "user_id": "550e8400-e29b-41d4-a716-446655440002",
            "full_name": "Sarah Johnson",
            "graduation_year": 2015,
            "degree": "Computer Science",
            "position": "Senior Software Engineer",
            "company": "Google",
            "industry": "Technology",
            "location": "San Francisco, CA",
            "experience_level": "senior",
            "skills": ["React", "Cloud Architecture", "System Design", "Technical Leadership"],
            "mentorship_available": true,
            "created_at": "2023-01-15T09:00:00Z"
        },
        {
            "user_id": "550e8400-e29b-41d4-a716-446655440003",
            "full_name": "Michael Chen",
            "graduation_year": 2018,
            "degree": "Business Administration",
            "position": "Product Manager",
            "company": "Amazon",
            "industry": "E-commerce",
            "location": "Seattle, WA",
            "experience_level": "mid",
            "skills": ["Product Strategy", "Career Transitions", "Networking"],
            "mentorship_available": true,
            "created_at": "2023-02-02T09:00:00Z"
        },
        {
            "user_id": "550e8400-e29b-41d4-a716-446655440004",
            "full_name": "Priya Patel",
            "graduation_year": 2020,
            "degree": "Data Science",
            "position": "Machine Learning Engineer",
            "company": "Google DeepMind",
            "industry": "Technology",
            "location": "London, UK",
            "experience_level": "junior",
            "skills": ["Python", "PyTorch", "MLOps"],
            "mentorship_available": false,
            "created_at": "2023-03-20T09:00:00Z"
        }
    ])
}

fn events() -> Value {
    json!([
        {
            "id": "550e8400-e29b-41d4-a716-446655440201",
            "title": "Bay Area Alumni Mixer",
            "description": "An evening of networking with alumni working in tech.",
            "event_type": "networking",
            "location": "San Francisco, CA",
            "start_date": "2027-03-14T18:00:00Z",
            "end_date": "2027-03-14T21:00:00Z",
            "is_virtual": false,
            "status": "published",
            "max_attendees": 80,
            "current_attendees": 1,
            "organizer_id": "550e8400-e29b-41d4-a716-446655440002"
        },
        {
            "id": "550e8400-e29b-41d4-a716-446655440202",
            "title": "Python for Data Careers",
            "description": "Hands-on workshop on Python tooling for analytics roles.",
            "event_type": "workshop",
            "location": "Online",
            "start_date": "2027-04-02T16:00:00Z",
            "end_date": "2027-04-02T18:00:00Z",
            "is_virtual": true,
            "status": "published",
            "max_attendees": 1,
            "current_attendees": 0,
            "organizer_id": "550e8400-e29b-41d4-a716-446655440004"
        }
    ])
}

fn forum_posts() -> Value {
    json!([
        {
            "id": "550e8400-e29b-41d4-a716-446655440301",
            "title": "Moving from engineering to product management",
            "content": "Has anyone made the switch? What helped you most?",
            "category_id": "550e8400-e29b-41d4-a716-446655440103",
            "author_id": "550e8400-e29b-41d4-a716-446655440003",
            "created_at": "2024-11-05T12:00:00Z"
        },
        {
            "id": "550e8400-e29b-41d4-a716-446655440302",
            "title": "Python study group",
            "content": "Weekly sessions for anyone brushing up on Python.",
            "category_id": "550e8400-e29b-41d4-a716-446655440101",
            "author_id": "550e8400-e29b-41d4-a716-446655440004",
            "created_at": "2024-12-01T08:30:00Z"
        }
    ])
}

fn registrations() -> Value {
    json!([
        {
            "id": "550e8400-e29b-41d4-a716-446655440401",
            "event_id": "550e8400-e29b-41d4-a716-446655440201",
            "user_id": "550e8400-e29b-41d4-a716-446655440003",
            "status": "registered",
            "registered_at": "2025-01-10T10:00:00Z"
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Predicate, Repository};

    #[tokio::test]
    async fn test_demo_repository_has_every_resource() {
        let repo = demo_repository();
        for resource in Resource::ALL {
            assert!(repo.count(resource, &Predicate::new()).await.unwrap() > 0, "{resource} is empty");
        }
    }
}
