/*!

This is the long-form manual for `urna_tally` and the `urna` terminal.

## Voting

Before any vote can be collected, the terminal needs two registries:

* the candidates, one per line: `name,number,party,jurisdiction,office`
* the voters, one per line: `name,id document,voter id,municipality,jurisdiction`

The office is one of the one-letter codes:

| code | office            |
|------|-------------------|
| `F`  | Deputado Federal  |
| `E`  | Deputado Estadual |
| `S`  | Senador           |
| `G`  | Governador        |
| `P`  | Presidente        |

The president is elected nationwide: the jurisdiction of a `P` candidate is
ignored when looking up candidate numbers. Lines that do not have exactly five
fields are skipped and reported.

```bash
urna --candidates candidatos.txt --voters eleitores.txt vote --jurisdiction SP
```

Only the voters registered in the jurisdiction of the terminal may vote. For each
office, the voter types the number of a candidate (and confirms it), `B` for a
blank vote, or an unknown number followed by a confirmation for a null vote.

## The ballot log

Each ballot is appended to the log (`votos.bin` by default) as one line of compact JSON:

```text
{"jurisdiction":"SP","voterId":"1001","choices":{"F":"1234","E":"Branco","S":"Nulo","G":"45","P":"13"}}
```

The log is never rewritten. A line that cannot be read is skipped with a warning,
except for an incomplete last line, which is the trace of an interrupted write
and is silently ignored.

## Counting

If the same voter appears several times in the same jurisdiction, only the first
ballot is counted. Blank and null votes are counted for the office, but not as
nominal votes.

```bash
urna --candidates candidatos.txt --voters eleitores.txt apuracao
urna --candidates candidatos.txt --voters eleitores.txt results
```

`apuracao` prints every bucket and writes the result file. `results` also writes the
ballot box bulletin and displays the votes of each office as a chart.

### Result file (`resultado_votos.txt`)

```text
Eleitores Aptos: 8
Total de Votos Nominais: 5
Brancos: 2
Nulos: 1

Candidato: 45 | Cargo: G | Estado: RJ | Votos: 1 (25.00%)
```

The percentage of a line is computed against all the votes for the same office. The
configuration key `percentageScope` set to `jurisdictionOffice` restricts it to the votes
of the same office in the same jurisdiction.

### Bulletin (`boletim_urna.txt`)

```text
Boletim de Urna

UF: RJ, Cargo: G, Número: 45, Votos: 1
```

## Configuration

All the paths can be given in a JSON file passed with `--config`:

```json
{
  "ballotLog": "votos.bin",
  "resultFile": "resultado_votos.txt",
  "boletimFile": "boletim_urna.txt",
  "candidatesFile": "candidatos.txt",
  "votersFile": "eleitores.txt",
  "jurisdiction": "SP",
  "percentageScope": "office"
}
```

Relative paths are resolved against the directory of the configuration file. The
command line flags take precedence over the configuration file. With `--out-dir`, the
ballot log and the produced files that are not named anywhere else are placed in the
given directory.

*/
