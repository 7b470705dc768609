pub mod day_planner;
