//! Interface de linha de comando do hirepath baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (rounds, candidates,
//! confirm, set-status, progress, evaluate, demo) e flags globais
//! (--config, --api-url, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hirepath::pipeline::RoundStatus;

/// hirepath — acompanha candidatos ao longo dos rounds de uma vaga.
#[derive(Debug, Parser)]
#[command(name = "hirepath", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho alternativo para o arquivo de configuração.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sobrescreve a URL base da API.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lista os rounds de uma vaga em ordem.
    Rounds {
        /// Identificador da vaga.
        job: String,

        /// Ignora o cache e consulta a API.
        #[arg(long)]
        refresh: bool,
    },

    /// Lista os candidatos de um round.
    Candidates {
        #[arg(long)]
        job: String,

        /// Identificador do template de round.
        template: String,

        /// Ignora o cache e consulta a API.
        #[arg(long)]
        refresh: bool,
    },

    /// Confirma (ativa) um template de round.
    Confirm {
        #[arg(long)]
        job: String,

        template: String,
    },

    /// Define o mesmo status para vários candidatos e envia o lote.
    SetStatus {
        #[arg(long)]
        job: String,

        template: String,

        /// action_pending, selected, rejected ou waitlisted.
        #[arg(value_parser = parse_status)]
        status: RoundStatus,

        /// Candidatos a atualizar.
        #[arg(required = true)]
        candidates: Vec<String>,
    },

    /// Leva todos os candidatos do round para o próximo round.
    Progress {
        #[arg(long)]
        job: String,

        template: String,
    },

    /// Solicita avaliações dos candidatos de um round, um por vez.
    Evaluate {
        #[arg(long)]
        job: String,

        template: String,
    },

    /// Executa a demonstração embutida com um backend em memória.
    Demo,
}

fn parse_status(raw: &str) -> Result<RoundStatus, String> {
    raw.parse()
}
