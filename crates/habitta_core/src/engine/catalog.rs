//! Built-in daily challenge catalog.

use crate::model::attributes::{Category, Difficulty};
use crate::model::challenge::ChallengeTemplate;

const fn template(
    title: &'static str,
    description: &'static str,
    category: Category,
    difficulty: Difficulty,
    xp_reward: u32,
) -> ChallengeTemplate {
    ChallengeTemplate {
        title,
        description,
        category,
        difficulty,
        xp_reward,
    }
}

#[rustfmt::skip]
static BUILTIN_CATALOG: [ChallengeTemplate; 20] = [
    template("Morning Meditation", "Start your day with 10 minutes of meditation", Category::Mindset, Difficulty::Easy, 15),
    template("Drink 8 Glasses of Water", "Stay hydrated throughout the day", Category::Health, Difficulty::Easy, 10),
    template("No Social Media Day", "Avoid all social media for the entire day", Category::Productivity, Difficulty::Hard, 30),
    template("Read for 30 Minutes", "Read a book or educational content for at least 30 minutes", Category::Learning, Difficulty::Medium, 20),
    template("Exercise for 45 Minutes", "Get moving with any form of exercise for 45 minutes", Category::Fitness, Difficulty::Medium, 25),
    template("Learn Something New", "Learn a new skill or fact today", Category::Learning, Difficulty::Medium, 20),
    template("No Caffeine", "Avoid caffeine for the entire day", Category::Health, Difficulty::Medium, 15),
    template("Deep Work Session", "Complete 2 hours of focused, deep work", Category::Productivity, Difficulty::Hard, 35),
    template("Kindness Challenge", "Do something kind for someone else", Category::Social, Difficulty::Easy, 15),
    template("Gratitude Practice", "Write down 3 things you are grateful for", Category::Mindset, Difficulty::Easy, 10),
    template("Digital Detox", "Stay away from screens for 2 hours before bed", Category::Health, Difficulty::Medium, 20),
    template("Healthy Meal Prep", "Prepare a healthy meal at home", Category::Health, Difficulty::Medium, 20),
    template("Connect with Someone", "Reach out to a friend or family member", Category::Social, Difficulty::Easy, 15),
    template("Creative Time", "Spend 30 minutes on a creative activity", Category::Creative, Difficulty::Easy, 15),
    template("Sleep Early", "Go to bed by 10 PM", Category::Health, Difficulty::Hard, 25),
    template("Cold Shower", "Take a cold shower to boost alertness", Category::Health, Difficulty::Hard, 20),
    template("No Complaints", "Go an entire day without complaining", Category::Mindset, Difficulty::Extreme, 40),
    template("Morning Walk", "Go for a 20-minute walk in the morning", Category::Fitness, Difficulty::Easy, 15),
    template("Practice Journaling", "Write in your journal for 15 minutes", Category::Mindset, Difficulty::Easy, 10),
    template("Declutter Space", "Organize or clean one area of your home", Category::Productivity, Difficulty::Medium, 20),
];

pub fn builtin_catalog() -> &'static [ChallengeTemplate] {
    &BUILTIN_CATALOG
}
