//! Case conversion between URL segments and class-style names.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// `"BlogPosts"` -> `"blog_posts"`.
pub fn underscore(word: &str) -> String {
    word.to_snake_case()
}

/// `"blog_posts"` -> `"BlogPosts"`.
pub fn camelize(word: &str) -> String {
    word.to_upper_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_both_ways() {
        assert_eq!(underscore("BlogPosts"), "blog_posts");
        assert_eq!(underscore("posts"), "posts");
        assert_eq!(camelize("blog_posts"), "BlogPosts");
        assert_eq!(camelize("pages"), "Pages");
    }
}
