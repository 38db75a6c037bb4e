use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use dbforge::checkpoint::RunState;
use dbforge::optimizer::runner::{Evolution, GenerationSummary, ProgressCallback};
use dbforge::optimizer::{Gene, Individual};
use dbforge::verifier::{TopPerformer, ValidationSummary};

pub fn print_run_header(state: &RunState) {
    let c = &state.options.config;
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Parameter").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    let rows: Vec<(&str, String)> = vec![
        ("Run id", state.run_id.clone()),
        ("Random seed", state.random_seed.clone()),
        ("Population size", c.search.population_size.to_string()),
        ("Crossover rate", c.search.crossover_rate.to_string()),
        ("Mutation rate", c.search.mutation_rate.to_string()),
        ("Elitism count", c.search.elitism_count.to_string()),
        ("Evaluation", c.evaluation.mode.to_string()),
        ("Truth table rows", state.options.truth_table.len().to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    println!("\n{}", table);
}

/// Grid of the mutable area, one cell per gene.
pub fn print_individual_grid(ind: &Individual) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    for chunk in ind.genes().chunks(ind.width().max(1)) {
        let cells: Vec<Cell> = chunk
            .iter()
            .map(|g| {
                let cell = match g {
                    Gene::Empty => Cell::new(" "),
                    Gene::Up => Cell::new("^").fg(Color::Cyan),
                    Gene::Down => Cell::new("v").fg(Color::Magenta),
                };
                cell.set_alignment(CellAlignment::Center)
            })
            .collect();
        table.add_row(cells);
    }
    println!("{}", table);
}

/// Prints each generation's best individual; never stops the run.
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_generation(&self, s: &GenerationSummary, best: &Individual) -> bool {
        println!(
            "\nGeneration {} of {} | best {} ({}/{}) | DBs {} (population {}..{}) | {}s",
            s.generation,
            s.last_generation,
            s.best_id,
            s.best_score,
            s.max_score,
            s.best_db_count,
            s.min_db_count,
            s.max_db_count,
            s.elapsed.as_secs()
        );
        print_individual_grid(best);
        true
    }
}

pub fn print_run_footer(evolution: &Evolution) {
    let state = evolution.state();
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Gen").add_attribute(Attribute::Bold),
        Cell::new("Best id"),
        Cell::new("Fitness").fg(Color::Cyan),
        Cell::new("DBs"),
    ]);
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for (i, g) in state.generations.iter().enumerate() {
        let (f, db) = state
            .stats(&g.best_individual)
            .map(|s| (s.f, s.db))
            .unwrap_or((0.0, 0));
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&g.best_individual),
            Cell::new(f).fg(Color::Cyan),
            Cell::new(db),
        ]);
    }
    println!("\n{}", table);
    println!(
        "Checkpoint: {} (random state {})",
        evolution.checkpoint_path().display(),
        evolution.rng().draws()
    );
}

pub fn print_validation_report(candidates: &[TopPerformer], summary: &ValidationSummary) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").add_attribute(Attribute::Bold),
        Cell::new("Fitness"),
        Cell::new("DBs"),
        Cell::new("Copies"),
        Cell::new("Result"),
    ]);

    for c in candidates {
        let accepted = summary.accepted.contains(&c.id);
        let result = if accepted {
            Cell::new("accepted").fg(Color::Green)
        } else {
            Cell::new("rejected").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&c.id),
            Cell::new(c.fitness),
            Cell::new(c.db_count),
            Cell::new(c.copies),
            result,
        ]);
    }
    println!("\n{}", table);
    println!(
        "{} of {} unique individuals exported to {}",
        summary.accepted.len(),
        summary.candidates,
        summary.destination.display()
    );
}
