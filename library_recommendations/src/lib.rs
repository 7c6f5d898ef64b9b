pub mod genre_index;
pub mod recommendations;
mod stop_words;
