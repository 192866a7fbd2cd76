//! Interface de terminal do hirepath — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`StepProgress`] acompanha visualmente uma
//! operação de várias etapas (progressão de round, avaliação em lote).

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use hirepath::pipeline::{
    CandidateRoundRecord, CommitReport, ProgressionReport, RoundState, RoundStatus, RoundTemplate,
    ScoreBand,
};

/// Estilo de cor para cada status de candidato.
fn status_style(status: RoundStatus) -> Style {
    match status {
        RoundStatus::Selected => Style::new().green().bold(),
        RoundStatus::Rejected => Style::new().red(),
        RoundStatus::Waitlisted => Style::new().yellow(),
        RoundStatus::ActionPending => Style::new().dim(),
    }
}

/// Estilo de cor para cada faixa de pontuação. Apenas apresentação.
fn band_style(band: ScoreBand) -> Style {
    match band {
        ScoreBand::Strong => Style::new().green().bold(),
        ScoreBand::Good => Style::new().cyan(),
        ScoreBand::Fair => Style::new().yellow(),
        ScoreBand::Weak => Style::new().red(),
    }
}

fn state_style(state: RoundState) -> Style {
    match state {
        RoundState::Confirmed => Style::new().green(),
        RoundState::Active => Style::new().cyan(),
        RoundState::Unlocked => Style::new().yellow(),
        RoundState::Locked => Style::new().dim(),
    }
}

/// Indicador visual de progresso para operações em várias etapas.
pub struct StepProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl StepProgress {
    /// Inicia o spinner com a mensagem inicial.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza a mensagem do spinner.
    pub fn step(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Exibe um aviso sem interromper o spinner.
    pub fn warn(&self, message: &str) {
        self.pb
            .println(format!("  {} {message}", self.yellow.apply_to("!")));
    }

    /// Finaliza o spinner com sucesso (verde) ou falha (vermelho).
    pub fn finish(&self, result: Result<&str, &str>) {
        self.pb.finish_and_clear();
        match result {
            Ok(message) => println!("  {} {message}", self.green.apply_to("✓")),
            Err(message) => println!("  {} {message}", self.red.apply_to("✗")),
        }
    }
}

/// Imprime os rounds de uma vaga com o estado de cada um.
pub fn print_rounds(rounds: &[(RoundTemplate, RoundState)]) {
    for (template, state) in rounds {
        let mandatory = if template.is_mandatory { "*" } else { " " };
        println!(
            "  {:>2}{mandatory} {:<28} {:<12} {}",
            template.order_index,
            template.name,
            state_style(*state).apply_to(state.to_string()),
            template.id
        );
    }
}

/// Imprime os candidatos de um round com status e faixa de pontuação.
pub fn print_candidates(records: &[CandidateRoundRecord]) {
    if records.is_empty() {
        println!("  (no candidates in this round)");
        return;
    }
    for record in records {
        let score = match record.evaluation.as_ref().and_then(|e| e.overall()) {
            Some(score) => band_style(ScoreBand::from_score(score))
                .apply_to(format!("{score:>5.1}"))
                .to_string(),
            None => "    -".to_string(),
        };
        println!(
            "  {:<24} {:<16} {score}  {}",
            record.display_name(),
            status_style(record.status).apply_to(record.status.to_string()),
            record.candidate_id
        );
    }
}

/// Resume o resultado de um commit em lote.
pub fn print_commit(report: &CommitReport) {
    println!(
        "  committed {} of {} status changes",
        report.succeeded.len(),
        report.submitted
    );
    for failed in &report.failed {
        println!(
            "    {} {}: {}",
            Style::new().red().apply_to("✗"),
            failed.candidate_id,
            failed.error.as_deref().unwrap_or("rejected")
        );
    }
}

/// Resume uma progressão de round, agrupando por status.
pub fn print_progression(report: &ProgressionReport) {
    println!(
        "  {} → {} ({} candidates carried forward)",
        report.from.name,
        report.to.name,
        report.carried.len()
    );
    for status in RoundStatus::ALL {
        let count = report.count(status);
        if count > 0 {
            println!("    {:<16} {count}", status_style(status).apply_to(status.to_string()));
        }
    }
}

/// Imprime uma linha de avaliação com a faixa colorida.
pub fn print_evaluation(candidate: &str, overall: Option<f64>) {
    match overall {
        Some(score) => {
            let band = ScoreBand::from_score(score);
            println!(
                "  {candidate:<24} {score:>5.1}  {}",
                band_style(band).apply_to(band.to_string())
            );
        }
        None => println!("  {candidate:<24}     -  no overall score"),
    }
}
