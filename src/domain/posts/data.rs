use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

use super::BlogPost;

struct SeedPost {
    id: u128,
    title: &'static str,
    excerpt: &'static str,
    content: &'static str,
    author_name: &'static str,
    published_at: OffsetDateTime,
    reading_time: u32,
    category: &'static str,
    tags: &'static [&'static str],
}

static SEED: [SeedPost; 6] = [
    SeedPost {
        id: 0x0b7c_1d52_5f0e_4c1a_9a55_0000_0000_0001,
        title: "Getting Started with React and TypeScript",
        excerpt: "Learn how to build modern web applications using React with TypeScript for better type safety and developer experience.",
        content: r#"# Getting Started with React and TypeScript

TypeScript has become an essential tool in modern React development.

## Why TypeScript with React?

- **Type Safety**: catch errors at compile time rather than runtime
- **Better IntelliSense**: enhanced autocomplete and documentation
- **Refactoring Confidence**: make changes with confidence

## Setting Up Your Project

```bash
npm create vite@latest my-app -- --template react-ts
cd my-app
npm install
```

Start building with TypeScript today!
"#,
        author_name: "Sarah Johnson",
        published_at: datetime!(2024-03-15 09:00 UTC),
        reading_time: 8,
        category: "Development",
        tags: &["React", "TypeScript", "Web Development"],
    },
    SeedPost {
        id: 0x0b7c_1d52_5f0e_4c1a_9a55_0000_0000_0002,
        title: "The Art of CSS Grid and Flexbox",
        excerpt: "Master modern CSS layout techniques to create responsive and beautiful user interfaces with ease.",
        content: r#"# The Art of CSS Grid and Flexbox

## Understanding Flexbox

```css
.container {
  display: flex;
  justify-content: space-between;
}
```

## Mastering CSS Grid

```css
.grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
}
```

Use Grid for the page structure and Flexbox for component internals.
"#,
        author_name: "Mike Chen",
        published_at: datetime!(2024-03-12 09:00 UTC),
        reading_time: 6,
        category: "Design",
        tags: &["CSS", "Design", "Layout"],
    },
    SeedPost {
        id: 0x0b7c_1d52_5f0e_4c1a_9a55_0000_0000_0003,
        title: "Building Scalable APIs with Node.js",
        excerpt: "Explore best practices for designing and implementing RESTful APIs that can handle growth.",
        content: r#"# Building Scalable APIs with Node.js

## API Design Principles

```
GET    /api/posts
POST   /api/posts
GET    /api/posts/:id
```

## Performance Optimization

- Implement caching strategies
- Use database indexing
- Paginate large result sets
"#,
        author_name: "Alex Rivera",
        published_at: datetime!(2024-03-10 09:00 UTC),
        reading_time: 10,
        category: "Backend",
        tags: &["Node.js", "API", "Backend"],
    },
    SeedPost {
        id: 0x0b7c_1d52_5f0e_4c1a_9a55_0000_0000_0004,
        title: "Mastering Tailwind CSS",
        excerpt: "Discover how utility-first CSS can revolutionize your development workflow and make styling faster.",
        content: r#"# Mastering Tailwind CSS

## The Utility-First Philosophy

```html
<div class="flex items-center justify-between p-4">
  <h2 class="text-2xl font-bold">Hello World</h2>
</div>
```

Embrace the utility-first approach and watch your productivity soar!
"#,
        author_name: "Emily Wong",
        published_at: datetime!(2024-03-08 09:00 UTC),
        reading_time: 7,
        category: "Design",
        tags: &["CSS", "Tailwind", "Design"],
    },
    SeedPost {
        id: 0x0b7c_1d52_5f0e_4c1a_9a55_0000_0000_0005,
        title: "Introduction to Web Accessibility",
        excerpt: "Learn why accessibility matters and how to make your websites usable for everyone.",
        content: r#"# Introduction to Web Accessibility

## Key Principles (WCAG)

1. **Perceivable**: information must be presentable
2. **Operable**: UI must be navigable
3. **Understandable**: content must be clear
4. **Robust**: work with assistive technologies
"#,
        author_name: "David Park",
        published_at: datetime!(2024-03-05 09:00 UTC),
        reading_time: 9,
        category: "Development",
        tags: &["Accessibility", "Web Development", "UX"],
    },
    SeedPost {
        id: 0x0b7c_1d52_5f0e_4c1a_9a55_0000_0000_0006,
        title: "State Management in Modern React",
        excerpt: "Compare different state management solutions and learn when to use each approach.",
        content: r#"# State Management in Modern React

## Server State vs Client State

- **Server State**: data from APIs
- **Client State**: UI state, form data

Keep state as local as possible.
"#,
        author_name: "Sarah Johnson",
        published_at: datetime!(2024-03-01 09:00 UTC),
        reading_time: 8,
        category: "Development",
        tags: &["React", "State Management", "Architecture"],
    },
];

/// Demo content used by the in-memory backend, newest first.
pub fn seed_posts() -> Vec<BlogPost> {
    SEED.iter()
        .map(|seed| BlogPost {
            id: Uuid::from_u128(seed.id),
            title: seed.title.to_string(),
            excerpt: seed.excerpt.to_string(),
            content: seed.content.to_string(),
            author_name: seed.author_name.to_string(),
            author_avatar: None,
            published_at: seed.published_at,
            reading_time: seed.reading_time,
            category: seed.category.to_string(),
            tags: seed.tags.iter().map(|tag| tag.to_string()).collect(),
            cover_image: None,
            is_published: true,
            created_at: Some(seed.published_at),
            updated_at: Some(seed.published_at),
        })
        .collect()
}
