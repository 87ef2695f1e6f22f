use crate::task::{Status, Subtask, Task, TaskId};

/// Tasks written to storage the first time the board is opened.
pub fn initial_tasks() -> Vec<Task> {
    vec![
        seed(
            1,
            "Launch Epic Career",
            "Create a killer resume and start applying",
            "Launch Career",
            Status::Todo,
            &[("Polish resume", false), ("Write cover letter", false)],
        ),
        seed(
            2,
            "Conquer React",
            "Build three small apps end to end",
            "Launch Career",
            Status::Todo,
            &[("Learn hooks", true), ("Learn routing", false)],
        ),
        seed(
            3,
            "Understand Databases",
            "Relational modelling, indexes and transactions",
            "Launch Career",
            Status::Todo,
            &[],
        ),
        seed(
            4,
            "Crack JS Interview",
            "Practice algorithm and system design questions",
            "Launch Career",
            Status::Doing,
            &[("Daily kata", false)],
        ),
        seed(
            5,
            "Master JavaScript",
            "Closures, prototypes and the event loop",
            "Launch Career",
            Status::Doing,
            &[],
        ),
        seed(
            6,
            "Never Give Up",
            "",
            "Launch Career",
            Status::Done,
            &[],
        ),
        seed(
            7,
            "Explore ES6 Features",
            "Modules, destructuring and iterators",
            "Roadmap",
            Status::Todo,
            &[],
        ),
        seed(
            8,
            "Have fun",
            "",
            "Roadmap",
            Status::Done,
            &[],
        ),
    ]
}

fn seed(
    id: TaskId,
    title: &str,
    description: &str,
    board: &str,
    status: Status,
    subtasks: &[(&str, bool)],
) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: description.to_string(),
        board: board.to_string(),
        status,
        subtasks: subtasks
            .iter()
            .zip(1..)
            .map(|((title, done), sub_id)| Subtask {
                id: sub_id,
                title: title.to_string(),
                is_completed: *done,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn seed_ids_are_unique_and_boards_non_empty() {
        let tasks = initial_tasks();
        let ids: HashSet<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), tasks.len());
        assert!(tasks.iter().all(|t| !t.board.is_empty()));
    }
}
