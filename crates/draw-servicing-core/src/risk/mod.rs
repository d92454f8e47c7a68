pub mod draw_score;
