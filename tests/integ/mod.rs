mod leaderboard_test;
mod persistence_test;
mod quiz_timer_test;
