mod comments;
mod reader_posts;
mod sites;
mod taxonomies;
mod uploads;
