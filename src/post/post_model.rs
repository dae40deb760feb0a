use serde::{Deserialize, Serialize};

/// A persisted post. The id is assigned by the store and never changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A post that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub description: String,
}

/// Exchange representation used by the JSON API and spreadsheet rows.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PostDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl PostDto {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
        }
    }
}

pub fn to_dto(post: &Post) -> PostDto {
    PostDto {
        id: Some(post.id),
        title: post.title.clone(),
        description: post.description.clone(),
    }
}

/// Any id carried by the dto is dropped; the store assigns a fresh one.
pub fn from_dto(dto: PostDto) -> NewPost {
    NewPost {
        title: dto.title,
        description: dto.description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dto_ignores_id() {
        let dto = PostDto {
            id: Some(99),
            title: "Hello".into(),
            description: "World".into(),
        };
        assert_eq!(
            from_dto(dto),
            NewPost {
                title: "Hello".into(),
                description: "World".into()
            }
        );
    }

    #[test]
    fn test_dto_json_defaults() {
        let dto: PostDto = serde_json::from_str(r#"{"title": "Only title"}"#).unwrap();
        assert_eq!(dto.id, None);
        assert_eq!(dto.title, "Only title");
        assert_eq!(dto.description, "");

        let post = Post {
            id: 4,
            title: "t".into(),
            description: "d".into(),
        };
        let json = serde_json::to_value(to_dto(&post)).unwrap();
        assert_eq!(json, serde_json::json!({"id": 4, "title": "t", "description": "d"}));
    }
}
